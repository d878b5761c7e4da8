//! PDF rendering for invoices.
//!
//! Supported providers:
//! - `disabled`: invoices are delivered without an attachment
//! - `http`: POSTs invoice data to an external renderer service

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

use domain::models::invoice::{Invoice, InvoiceLine};

use crate::config::PdfConfig;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF renderer not configured")]
    NotConfigured,

    #[error("Renderer request failed: {0}")]
    RequestFailed(String),

    #[error("Renderer returned {status}: {body}")]
    RendererError { status: u16, body: String },
}

/// Payload sent to the external renderer.
#[derive(Debug, Serialize)]
struct RenderRequest<'a> {
    invoice: &'a Invoice,
    lines: &'a [InvoiceLine],
}

/// Produces the PDF attachment for an invoice.
///
/// `Ok(None)` means rendering is disabled and the invoice should be
/// delivered without an attachment.
#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render(
        &self,
        invoice: &Invoice,
        lines: &[InvoiceLine],
    ) -> Result<Option<Vec<u8>>, PdfError>;
}

/// PDF service delegating to an external HTTP renderer.
#[derive(Clone)]
pub struct PdfService {
    config: Arc<PdfConfig>,
    client: reqwest::Client,
}

impl PdfService {
    pub fn new(config: PdfConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            config: Arc::new(config),
            client,
        }
    }

    async fn render_http(
        &self,
        invoice: &Invoice,
        lines: &[InvoiceLine],
    ) -> Result<Option<Vec<u8>>, PdfError> {
        if self.config.url.is_empty() {
            return Err(PdfError::NotConfigured);
        }

        let response = self
            .client
            .post(&self.config.url)
            .json(&RenderRequest { invoice, lines })
            .send()
            .await
            .map_err(|e| PdfError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            error!(status, body = %body, "PDF renderer returned an error");
            return Err(PdfError::RendererError { status, body });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PdfError::RequestFailed(e.to_string()))?;
        debug!(invoice = %invoice.number, size = bytes.len(), "Rendered invoice PDF");
        Ok(Some(bytes.to_vec()))
    }
}

#[async_trait]
impl PdfRenderer for PdfService {
    async fn render(
        &self,
        invoice: &Invoice,
        lines: &[InvoiceLine],
    ) -> Result<Option<Vec<u8>>, PdfError> {
        match self.config.provider.as_str() {
            "disabled" => Ok(None),
            "http" => self.render_http(invoice, lines).await,
            provider => {
                error!(provider = %provider, "Unknown PDF provider");
                Err(PdfError::NotConfigured)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use domain::models::invoice::InvoiceStatus;
    use uuid::Uuid;

    fn invoice() -> Invoice {
        Invoice {
            id: Uuid::new_v4(),
            number: "260001".to_string(),
            client_id: Uuid::new_v4(),
            project_id: None,
            issue_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            due_date: None,
            subtotal: 100.0,
            vat_rate: 21.0,
            withholding_rate: 15.0,
            total: 106.0,
            status: InvoiceStatus::Draft,
            scheduled_send_date: None,
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_disabled_provider_returns_none() {
        let service = PdfService::new(PdfConfig::default());
        let result = service.render(&invoice(), &[]).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_http_provider_without_url_fails() {
        let service = PdfService::new(PdfConfig {
            provider: "http".to_string(),
            url: String::new(),
            timeout_secs: 5,
        });
        assert!(matches!(
            service.render(&invoice(), &[]).await,
            Err(PdfError::NotConfigured)
        ));
    }
}
