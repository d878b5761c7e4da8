//! Daily recurring billing run.
//!
//! Fires once a day at a configured UTC hour and materializes invoices from
//! every template due that day. The engine's watermark makes a crashed and
//! restarted run safe to repeat.

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use crate::services::BillingEngine;

use super::scheduler::{Job, JobFrequency};

/// Background job driving the recurring billing engine.
pub struct RecurringBillingJob {
    engine: Arc<BillingEngine>,
    run_hour_utc: u32,
}

impl RecurringBillingJob {
    pub fn new(engine: Arc<BillingEngine>, run_hour_utc: u32) -> Self {
        Self {
            engine,
            run_hour_utc,
        }
    }
}

#[async_trait::async_trait]
impl Job for RecurringBillingJob {
    fn name(&self) -> &'static str {
        "recurring_billing"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::DailyAt(self.run_hour_utc)
    }

    async fn execute(&self) -> Result<(), String> {
        let today = Utc::now().date_naive();
        let summary = self
            .engine
            .run_once(today)
            .await
            .map_err(|e| format!("Recurring billing run failed: {}", e))?;

        if summary.failed > 0 {
            warn!(
                generated = summary.generated,
                delivered = summary.delivered,
                failed = summary.failed,
                errors = ?summary.errors,
                "Recurring billing run finished with failures"
            );
        } else if summary.generated > 0 {
            info!(
                generated = summary.generated,
                delivered = summary.delivered,
                "Recurring billing run generated invoices"
            );
        }

        Ok(())
    }
}
