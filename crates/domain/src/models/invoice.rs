//! Invoice domain model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use shared::validation::{validate_quantity, validate_tax_rate, validate_unit_price};

/// Invoice lifecycle status.
///
/// The status is advisory metadata: no transition is enforced, any status
/// may be set directly. `Overdue` is applied by a time-based sweep over
/// `Sent` invoices, not by invoice mutations themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Scheduled,
    Sent,
    Paid,
    Overdue,
}

impl InvoiceStatus {
    /// Database representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Scheduled => "scheduled",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
        }
    }

    /// Parses a stored status, falling back to `Draft` for unknown values.
    pub fn from_db(value: &str) -> Self {
        match value {
            "scheduled" => InvoiceStatus::Scheduled,
            "sent" => InvoiceStatus::Sent,
            "paid" => InvoiceStatus::Paid,
            "overdue" => InvoiceStatus::Overdue,
            _ => InvoiceStatus::Draft,
        }
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Represents an invoice in the system.
///
/// `number` is the sequential human-facing identifier issued at creation
/// time, distinct from the opaque `id`. `subtotal` and `total` always
/// reflect the persisted lines and rates; they are computed at persistence
/// time, never lazily.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Invoice {
    pub id: Uuid,
    pub number: String,
    pub client_id: Uuid,
    pub project_id: Option<Uuid>,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub subtotal: f64,
    /// VAT rate as a percentage (e.g. 21.0).
    pub vat_rate: f64,
    /// Withholding rate as a percentage (e.g. 15.0).
    pub withholding_rate: f64,
    pub total: f64,
    pub status: InvoiceStatus,
    pub scheduled_send_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A single invoice line, exclusively owned by its invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct InvoiceLine {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub concept: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub line_total: f64,
}

/// Line item supplied when creating or replacing invoice lines.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct NewInvoiceLine {
    #[validate(length(min = 1, max = 500, message = "Concept must be 1-500 characters"))]
    pub concept: String,

    #[validate(custom(function = "validate_quantity"))]
    pub quantity: f64,

    #[validate(custom(function = "validate_unit_price"))]
    pub unit_price: f64,
}

/// Request payload for creating an invoice.
///
/// When `number` is omitted the sequential issuer assigns the next one.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateInvoiceRequest {
    pub client_id: Uuid,

    pub project_id: Option<Uuid>,

    /// Explicit invoice number; normally absent.
    #[validate(length(min = 1, max = 20, message = "Number must be 1-20 characters"))]
    pub number: Option<String>,

    pub issue_date: NaiveDate,

    pub due_date: Option<NaiveDate>,

    #[validate(custom(function = "validate_tax_rate"))]
    pub vat_rate: f64,

    #[validate(custom(function = "validate_tax_rate"))]
    pub withholding_rate: f64,

    #[validate(length(min = 1, message = "At least one line is required"))]
    #[validate(nested)]
    pub lines: Vec<NewInvoiceLine>,

    #[validate(length(max = 2000, message = "Notes must be at most 2000 characters"))]
    pub notes: Option<String>,

    pub status: Option<InvoiceStatus>,

    pub scheduled_send_date: Option<NaiveDate>,
}

/// Request payload for updating an invoice (partial update).
///
/// Two mutually exclusive shapes are supported: a line-set replacement
/// (`lines` present, optionally with new rates) that recomputes totals, or
/// a metadata-only patch that never touches lines or totals. Supplying both
/// in one request is a validation error.
///
/// Absent fields and explicit JSON nulls deserialize to the same `None`, so
/// nullable columns (`project_id`, `due_date`, `scheduled_send_date`,
/// `notes`) can only be overwritten through a patch, never cleared back to
/// null.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateInvoiceRequest {
    #[validate(nested)]
    pub lines: Option<Vec<NewInvoiceLine>>,

    #[validate(custom(function = "validate_tax_rate"))]
    pub vat_rate: Option<f64>,

    #[validate(custom(function = "validate_tax_rate"))]
    pub withholding_rate: Option<f64>,

    #[validate(length(min = 1, max = 20, message = "Number must be 1-20 characters"))]
    pub number: Option<String>,

    pub client_id: Option<Uuid>,

    pub project_id: Option<Uuid>,

    pub issue_date: Option<NaiveDate>,

    pub due_date: Option<NaiveDate>,

    pub status: Option<InvoiceStatus>,

    pub scheduled_send_date: Option<NaiveDate>,

    #[validate(length(max = 2000, message = "Notes must be at most 2000 characters"))]
    pub notes: Option<String>,
}

impl UpdateInvoiceRequest {
    /// True when the patch replaces the invoice's line set.
    pub fn is_line_replacement(&self) -> bool {
        self.lines.is_some()
    }

    /// True when the patch carries any metadata field.
    pub fn has_metadata_fields(&self) -> bool {
        self.number.is_some()
            || self.client_id.is_some()
            || self.project_id.is_some()
            || self.issue_date.is_some()
            || self.due_date.is_some()
            || self.status.is_some()
            || self.scheduled_send_date.is_some()
            || self.notes.is_some()
    }

    /// True when the patch carries nothing at all.
    pub fn is_empty(&self) -> bool {
        !self.is_line_replacement()
            && !self.has_metadata_fields()
            && self.vat_rate.is_none()
            && self.withholding_rate.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_line() -> NewInvoiceLine {
        NewInvoiceLine {
            concept: "Consulting".to_string(),
            quantity: 2.0,
            unit_price: 50.0,
        }
    }

    #[test]
    fn test_status_round_trips_through_db_form() {
        for status in [
            InvoiceStatus::Draft,
            InvoiceStatus::Scheduled,
            InvoiceStatus::Sent,
            InvoiceStatus::Paid,
            InvoiceStatus::Overdue,
        ] {
            assert_eq!(InvoiceStatus::from_db(status.as_str()), status);
        }
    }

    #[test]
    fn test_status_unknown_value_falls_back_to_draft() {
        assert_eq!(InvoiceStatus::from_db("cancelled"), InvoiceStatus::Draft);
    }

    #[test]
    fn test_create_request_rejects_empty_lines() {
        let request = CreateInvoiceRequest {
            client_id: Uuid::new_v4(),
            project_id: None,
            number: None,
            issue_date: NaiveDate::from_ymd_opt(2026, 3, 15).unwrap(),
            due_date: None,
            vat_rate: 21.0,
            withholding_rate: 15.0,
            lines: vec![],
            notes: None,
            status: None,
            scheduled_send_date: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_create_request_rejects_non_positive_unit_price() {
        let mut line = valid_line();
        line.unit_price = 0.0;
        let request = CreateInvoiceRequest {
            client_id: Uuid::new_v4(),
            project_id: None,
            number: None,
            issue_date: NaiveDate::from_ymd_opt(2026, 3, 15).unwrap(),
            due_date: None,
            vat_rate: 21.0,
            withholding_rate: 15.0,
            lines: vec![line],
            notes: None,
            status: None,
            scheduled_send_date: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_update_request_shape_detection() {
        let metadata_only = UpdateInvoiceRequest {
            status: Some(InvoiceStatus::Paid),
            ..Default::default()
        };
        assert!(!metadata_only.is_line_replacement());
        assert!(metadata_only.has_metadata_fields());

        let line_replacement = UpdateInvoiceRequest {
            lines: Some(vec![valid_line()]),
            vat_rate: Some(21.0),
            withholding_rate: Some(15.0),
            ..Default::default()
        };
        assert!(line_replacement.is_line_replacement());
        assert!(!line_replacement.has_metadata_fields());
    }

    #[test]
    fn test_update_request_empty_patch() {
        let patch = UpdateInvoiceRequest::default();
        assert!(patch.is_empty());
    }
}
