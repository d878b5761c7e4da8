//! Currency rounding helpers.
//!
//! All monetary amounts in the system are stored with 2 decimal places of
//! precision, rounded at computation time rather than at display time.

/// Rounds an amount to 2 decimal places (cents).
///
/// Uses round-half-away-from-zero, matching how totals were historically
/// persisted, so recomputing a stored total always reproduces it exactly.
pub fn round2(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Formats an amount with 2 decimal places for email bodies and logs.
pub fn format_amount(amount: f64) -> String {
    format!("{:.2}", amount)
}
