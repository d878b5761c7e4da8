//! Recurring invoice template domain model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use shared::validation::{
    validate_quantity, validate_tax_rate, validate_trigger_day, validate_unit_price,
};

/// A saved blueprint used to materialize a new invoice each month.
///
/// `last_generation_date` is the idempotency watermark: once it falls in the
/// current calendar month the template is excluded from generation until the
/// month rolls over. It is mutated exclusively by the billing engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RecurringTemplate {
    pub id: Uuid,
    pub client_id: Uuid,
    pub project_id: Option<Uuid>,
    /// Day of month the template triggers on (1-28).
    pub day_of_month: i32,
    pub vat_rate: f64,
    pub withholding_rate: f64,
    pub notes: Option<String>,
    pub active: bool,
    pub last_generation_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// A line owned by a recurring template.
///
/// No total is stored; amounts are recomputed on every generation so a rate
/// edit on the template takes effect the next month.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RecurringLine {
    pub id: Uuid,
    pub template_id: Uuid,
    pub concept: String,
    /// Defaults to 1 at generation time when unset.
    pub quantity: Option<f64>,
    pub unit_price: f64,
}

/// Line item supplied when creating or replacing template lines.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct NewRecurringLine {
    #[validate(length(min = 1, max = 500, message = "Concept must be 1-500 characters"))]
    pub concept: String,

    #[validate(custom(function = "validate_optional_quantity"))]
    pub quantity: Option<f64>,

    #[validate(custom(function = "validate_unit_price"))]
    pub unit_price: f64,
}

fn validate_optional_quantity(quantity: f64) -> Result<(), validator::ValidationError> {
    validate_quantity(quantity)
}

fn default_active() -> bool {
    true
}

/// Request payload for creating a recurring template.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateTemplateRequest {
    pub client_id: Uuid,

    pub project_id: Option<Uuid>,

    #[validate(custom(function = "validate_trigger_day"))]
    pub day_of_month: i32,

    #[validate(custom(function = "validate_tax_rate"))]
    pub vat_rate: f64,

    #[validate(custom(function = "validate_tax_rate"))]
    pub withholding_rate: f64,

    #[validate(length(max = 2000, message = "Notes must be at most 2000 characters"))]
    pub notes: Option<String>,

    #[serde(default = "default_active")]
    pub active: bool,

    #[validate(nested)]
    #[serde(default)]
    pub lines: Vec<NewRecurringLine>,
}

/// Request payload for updating a recurring template (partial update).
///
/// A present `lines` field replaces the whole line set; absent leaves the
/// lines untouched. `last_generation_date` is deliberately not patchable.
///
/// Absent fields and explicit JSON nulls deserialize to the same `None`, so
/// nullable columns (`project_id`, `notes`) can only be overwritten through
/// a patch, never cleared back to null.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateTemplateRequest {
    pub client_id: Option<Uuid>,

    pub project_id: Option<Uuid>,

    #[validate(custom(function = "validate_trigger_day"))]
    pub day_of_month: Option<i32>,

    #[validate(custom(function = "validate_tax_rate"))]
    pub vat_rate: Option<f64>,

    #[validate(custom(function = "validate_tax_rate"))]
    pub withholding_rate: Option<f64>,

    #[validate(length(max = 2000, message = "Notes must be at most 2000 characters"))]
    pub notes: Option<String>,

    pub active: Option<bool>,

    #[validate(nested)]
    pub lines: Option<Vec<NewRecurringLine>>,
}
