//! Email log entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::email_log::{EmailLogEntry, EmailOutcome};

/// Database row mapping for the email_log table.
#[derive(Debug, Clone, FromRow)]
pub struct EmailLogEntity {
    pub id: Uuid,
    pub invoice_id: Option<Uuid>,
    pub invoice_number: Option<String>,
    pub recipient: String,
    pub subject: String,
    pub outcome: String,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<EmailLogEntity> for EmailLogEntry {
    fn from(entity: EmailLogEntity) -> Self {
        Self {
            id: entity.id,
            invoice_id: entity.invoice_id,
            invoice_number: entity.invoice_number,
            recipient: entity.recipient,
            subject: entity.subject,
            outcome: EmailOutcome::from_db(&entity.outcome),
            error_message: entity.error_message,
            created_at: entity.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_survives_deleted_invoice() {
        // invoice_id nulled out, number snapshot kept
        let entity = EmailLogEntity {
            id: Uuid::new_v4(),
            invoice_id: None,
            invoice_number: Some("260007".to_string()),
            recipient: "billing@acme.example".to_string(),
            subject: "Factura 260007".to_string(),
            outcome: "sent".to_string(),
            error_message: None,
            created_at: Utc::now(),
        };
        let entry: EmailLogEntry = entity.into();
        assert!(entry.invoice_id.is_none());
        assert_eq!(entry.invoice_number.as_deref(), Some("260007"));
        assert_eq!(entry.outcome, EmailOutcome::Sent);
    }
}
