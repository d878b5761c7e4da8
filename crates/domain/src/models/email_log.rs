//! Email delivery log domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of a delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailOutcome {
    Sent,
    Error,
}

impl EmailOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailOutcome::Sent => "sent",
            EmailOutcome::Error => "error",
        }
    }

    pub fn from_db(value: &str) -> Self {
        match value {
            "sent" => EmailOutcome::Sent,
            _ => EmailOutcome::Error,
        }
    }
}

/// An append-only record of one email send attempt.
///
/// `invoice_id` is a weak reference: the entry stays readable after the
/// invoice is deleted, which is why `invoice_number` is snapshotted here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EmailLogEntry {
    pub id: Uuid,
    pub invoice_id: Option<Uuid>,
    pub invoice_number: Option<String>,
    pub recipient: String,
    pub subject: String,
    pub outcome: EmailOutcome,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Payload for appending a log entry.
#[derive(Debug, Clone)]
pub struct NewEmailLogEntry {
    pub invoice_id: Option<Uuid>,
    pub invoice_number: Option<String>,
    pub recipient: String,
    pub subject: String,
    pub outcome: EmailOutcome,
    pub error_message: Option<String>,
}

impl NewEmailLogEntry {
    /// Entry for a successful send.
    pub fn sent(invoice_id: Uuid, invoice_number: &str, recipient: &str, subject: &str) -> Self {
        Self {
            invoice_id: Some(invoice_id),
            invoice_number: Some(invoice_number.to_string()),
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            outcome: EmailOutcome::Sent,
            error_message: None,
        }
    }

    /// Entry for a failed send, keeping the underlying error message.
    pub fn failed(
        invoice_id: Uuid,
        invoice_number: &str,
        recipient: &str,
        subject: &str,
        error: &str,
    ) -> Self {
        Self {
            invoice_id: Some(invoice_id),
            invoice_number: Some(invoice_number.to_string()),
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            outcome: EmailOutcome::Error,
            error_message: Some(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_db_form() {
        assert_eq!(EmailOutcome::Sent.as_str(), "sent");
        assert_eq!(EmailOutcome::Error.as_str(), "error");
        assert_eq!(EmailOutcome::from_db("sent"), EmailOutcome::Sent);
        assert_eq!(EmailOutcome::from_db("error"), EmailOutcome::Error);
    }

    #[test]
    fn test_failed_entry_keeps_error_message() {
        let entry = NewEmailLogEntry::failed(
            Uuid::new_v4(),
            "260007",
            "billing@acme.example",
            "Factura 260007",
            "connection refused",
        );
        assert_eq!(entry.outcome, EmailOutcome::Error);
        assert_eq!(entry.error_message.as_deref(), Some("connection refused"));
        assert_eq!(entry.invoice_number.as_deref(), Some("260007"));
    }
}
