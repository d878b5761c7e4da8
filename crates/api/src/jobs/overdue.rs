//! Daily sweep flipping sent invoices past their due date to overdue.

use chrono::Utc;
use tracing::info;

use persistence::repositories::InvoiceRepository;

use super::scheduler::{Job, JobFrequency};

/// Background job applying the overdue status.
pub struct OverdueSweepJob {
    invoices: InvoiceRepository,
}

impl OverdueSweepJob {
    pub fn new(invoices: InvoiceRepository) -> Self {
        Self { invoices }
    }
}

#[async_trait::async_trait]
impl Job for OverdueSweepJob {
    fn name(&self) -> &'static str {
        "overdue_sweep"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Daily
    }

    async fn execute(&self) -> Result<(), String> {
        let today = Utc::now().date_naive();
        let updated = self
            .invoices
            .mark_overdue(today)
            .await
            .map_err(|e| format!("Overdue sweep failed: {}", e))?;

        if updated > 0 {
            info!(updated, "Invoices marked overdue");
        }

        Ok(())
    }
}
