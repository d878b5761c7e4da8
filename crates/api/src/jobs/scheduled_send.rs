//! Hourly sweep over invoices scheduled for sending.
//!
//! Picks up invoices in `scheduled` status whose send date has arrived and
//! delivers them through the billing engine. Delivery moves an invoice to
//! `sent`, which removes it from the next sweep; a failed delivery leaves it
//! scheduled and it is retried on the next pass.

use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use persistence::repositories::InvoiceRepository;

use crate::services::billing::DeliveryOutcome;
use crate::services::BillingEngine;

use super::scheduler::{Job, JobFrequency};

/// Background job delivering scheduled invoices.
pub struct ScheduledSendJob {
    invoices: InvoiceRepository,
    engine: Arc<BillingEngine>,
}

impl ScheduledSendJob {
    pub fn new(invoices: InvoiceRepository, engine: Arc<BillingEngine>) -> Self {
        Self { invoices, engine }
    }
}

#[async_trait::async_trait]
impl Job for ScheduledSendJob {
    fn name(&self) -> &'static str {
        "scheduled_send"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Hourly
    }

    async fn execute(&self) -> Result<(), String> {
        let today = Utc::now().date_naive();
        let due = self
            .invoices
            .find_due_scheduled(today)
            .await
            .map_err(|e| format!("Failed to load scheduled invoices: {}", e))?;

        if due.is_empty() {
            return Ok(());
        }

        let mut delivered = 0usize;
        let mut failed = 0usize;
        for entity in due {
            let (invoice, contact) = entity.into_parts();
            let lines: Vec<domain::models::invoice::InvoiceLine> = self
                .invoices
                .lines(invoice.id)
                .await
                .map_err(|e| format!("Failed to load invoice lines: {}", e))?
                .into_iter()
                .map(Into::into)
                .collect();

            match self
                .engine
                .deliver_invoice(&invoice, &lines, &contact)
                .await
                .map_err(|e| format!("Delivery failed for {}: {}", invoice.number, e))?
            {
                DeliveryOutcome::Delivered => delivered += 1,
                DeliveryOutcome::Failed => failed += 1,
                DeliveryOutcome::Skipped => {}
            }
        }

        info!(delivered, failed, "Scheduled send sweep finished");
        Ok(())
    }
}
