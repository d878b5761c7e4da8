//! Invoice entities (database row mappings).

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::client::ClientContact;
use domain::models::invoice::{Invoice, InvoiceLine, InvoiceStatus};

/// Database row mapping for the invoices table.
#[derive(Debug, Clone, FromRow)]
pub struct InvoiceEntity {
    pub id: Uuid,
    pub number: String,
    pub client_id: Uuid,
    pub project_id: Option<Uuid>,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub subtotal: f64,
    pub vat_rate: f64,
    pub withholding_rate: f64,
    pub total: f64,
    pub status: String,
    pub scheduled_send_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<InvoiceEntity> for Invoice {
    fn from(entity: InvoiceEntity) -> Self {
        Self {
            id: entity.id,
            number: entity.number,
            client_id: entity.client_id,
            project_id: entity.project_id,
            issue_date: entity.issue_date,
            due_date: entity.due_date,
            subtotal: entity.subtotal,
            vat_rate: entity.vat_rate,
            withholding_rate: entity.withholding_rate,
            total: entity.total,
            status: InvoiceStatus::from_db(&entity.status),
            scheduled_send_date: entity.scheduled_send_date,
            notes: entity.notes,
            created_at: entity.created_at,
        }
    }
}

/// Database row mapping for the invoice_lines table.
#[derive(Debug, Clone, FromRow)]
pub struct InvoiceLineEntity {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub concept: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub line_total: f64,
}

impl From<InvoiceLineEntity> for InvoiceLine {
    fn from(entity: InvoiceLineEntity) -> Self {
        Self {
            id: entity.id,
            invoice_id: entity.invoice_id,
            concept: entity.concept,
            quantity: entity.quantity,
            unit_price: entity.unit_price,
            line_total: entity.line_total,
        }
    }
}

/// Row shape of the due-scheduled sweep query: an invoice joined with the
/// contact fields of its client.
#[derive(Debug, Clone, FromRow)]
pub struct ScheduledInvoiceEntity {
    pub id: Uuid,
    pub number: String,
    pub client_id: Uuid,
    pub project_id: Option<Uuid>,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub subtotal: f64,
    pub vat_rate: f64,
    pub withholding_rate: f64,
    pub total: f64,
    pub status: String,
    pub scheduled_send_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub client_name: String,
    pub client_email: Option<String>,
}

impl ScheduledInvoiceEntity {
    /// Splits the joined row into the invoice and its client contact.
    pub fn into_parts(self) -> (Invoice, ClientContact) {
        let contact = ClientContact {
            id: self.client_id,
            name: self.client_name,
            email: self.client_email,
        };
        let invoice = Invoice {
            id: self.id,
            number: self.number,
            client_id: self.client_id,
            project_id: self.project_id,
            issue_date: self.issue_date,
            due_date: self.due_date,
            subtotal: self.subtotal,
            vat_rate: self.vat_rate,
            withholding_rate: self.withholding_rate,
            total: self.total,
            status: InvoiceStatus::from_db(&self.status),
            scheduled_send_date: self.scheduled_send_date,
            notes: self.notes,
            created_at: self.created_at,
        };
        (invoice, contact)
    }
}
