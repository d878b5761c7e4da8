//! Common validation utilities for billing input.

use validator::ValidationError;

/// Lowest day-of-month a recurring template may trigger on.
pub const MIN_TRIGGER_DAY: i32 = 1;

/// Highest day-of-month a recurring template may trigger on.
///
/// Capped at 28 so a trigger day exists in every month; February would
/// otherwise silently skip templates configured for day 29-31.
pub const MAX_TRIGGER_DAY: i32 = 28;

/// Validates that a quantity is a non-negative finite number.
pub fn validate_quantity(quantity: f64) -> Result<(), ValidationError> {
    if quantity.is_finite() && quantity >= 0.0 {
        Ok(())
    } else {
        let mut err = ValidationError::new("quantity_range");
        err.message = Some("Quantity must be a non-negative number".into());
        Err(err)
    }
}

/// Validates that a unit price is a positive finite number.
pub fn validate_unit_price(unit_price: f64) -> Result<(), ValidationError> {
    if unit_price.is_finite() && unit_price > 0.0 {
        Ok(())
    } else {
        let mut err = ValidationError::new("unit_price_range");
        err.message = Some("Unit price must be a positive number".into());
        Err(err)
    }
}

/// Validates that a tax rate (VAT or withholding) is a percentage in 0-100.
pub fn validate_tax_rate(rate: f64) -> Result<(), ValidationError> {
    if rate.is_finite() && (0.0..=100.0).contains(&rate) {
        Ok(())
    } else {
        let mut err = ValidationError::new("tax_rate_range");
        err.message = Some("Tax rate must be between 0 and 100".into());
        Err(err)
    }
}

/// Validates a recurring template trigger day (1-28).
pub fn validate_trigger_day(day: i32) -> Result<(), ValidationError> {
    if (MIN_TRIGGER_DAY..=MAX_TRIGGER_DAY).contains(&day) {
        Ok(())
    } else {
        let mut err = ValidationError::new("trigger_day_range");
        err.message = Some("Day of month must be between 1 and 28".into());
        Err(err)
    }
}
