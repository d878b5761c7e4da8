//! Email delivery log repository.
//!
//! Append-only: entries are never updated or deleted by the application.

use sqlx::PgPool;

use domain::models::email_log::NewEmailLogEntry;

use crate::entities::EmailLogEntity;
use crate::metrics::QueryTimer;

/// Repository for the email delivery audit log.
#[derive(Clone)]
pub struct EmailLogRepository {
    pool: PgPool,
}

impl EmailLogRepository {
    /// Creates a new EmailLogRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Appends a log entry.
    pub async fn record(&self, entry: &NewEmailLogEntry) -> Result<EmailLogEntity, sqlx::Error> {
        let timer = QueryTimer::new("record_email_log");
        let result = sqlx::query_as::<_, EmailLogEntity>(
            r#"
            INSERT INTO email_log (invoice_id, invoice_number, recipient, subject,
                                   outcome, error_message)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, invoice_id, invoice_number, recipient, subject,
                      outcome, error_message, created_at
            "#,
        )
        .bind(entry.invoice_id)
        .bind(entry.invoice_number.as_deref())
        .bind(&entry.recipient)
        .bind(&entry.subject)
        .bind(entry.outcome.as_str())
        .bind(entry.error_message.as_deref())
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Lists all entries, newest first.
    pub async fn list_all(&self) -> Result<Vec<EmailLogEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_email_log");
        let result = sqlx::query_as::<_, EmailLogEntity>(
            r#"
            SELECT id, invoice_id, invoice_number, recipient, subject,
                   outcome, error_message, created_at
            FROM email_log
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
