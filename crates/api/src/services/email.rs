//! Email service for sending invoices.
//!
//! Supported providers:
//! - `console`: Logs emails to console (development)
//! - `sendgrid`: Sends via the SendGrid API

use async_trait::async_trait;
use base64::Engine as _;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::EmailConfig;

/// Errors that can occur during email operations.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Email service not configured")]
    NotConfigured,

    #[error("Failed to send email: {0}")]
    SendFailed(String),

    #[error("Provider error: {0}")]
    ProviderError(String),
}

/// A file attached to an outgoing email.
#[derive(Debug, Clone)]
pub struct EmailAttachment {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Email message to be sent.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    /// Recipient email address
    pub to: String,
    /// Sender email address
    pub from: String,
    /// Email subject
    pub subject: String,
    /// Plain text body
    pub body: String,
    /// Attachments (rendered invoice PDFs)
    pub attachments: Vec<EmailAttachment>,
}

/// Abstraction over the outgoing mail channel.
///
/// A send that returns `Err` signals delivery failure; callers in the
/// billing engine treat that as non-fatal and log it.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError>;
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    config: Arc<EmailConfig>,
}

impl EmailService {
    /// Creates a new EmailService with the given configuration.
    pub fn new(config: EmailConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Check if email service is enabled.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Console provider - logs the email instead of sending it.
    async fn send_console(&self, message: EmailMessage) -> Result<(), EmailError> {
        info!(
            to = %message.to,
            from = %message.from,
            subject = %message.subject,
            attachments = message.attachments.len(),
            "Email (console provider)"
        );
        debug!(body = %message.body, "Email body");
        Ok(())
    }

    /// SendGrid provider - sends via the SendGrid API.
    async fn send_sendgrid(&self, message: EmailMessage) -> Result<(), EmailError> {
        if self.config.sendgrid_api_key.is_empty() {
            return Err(EmailError::NotConfigured);
        }

        let client = reqwest::Client::new();

        let attachments: Vec<serde_json::Value> = message
            .attachments
            .iter()
            .map(|attachment| {
                serde_json::json!({
                    "content": base64::engine::general_purpose::STANDARD.encode(&attachment.data),
                    "type": attachment.content_type,
                    "filename": attachment.filename,
                    "disposition": "attachment"
                })
            })
            .collect();

        let mut body = serde_json::json!({
            "personalizations": [{
                "to": [{ "email": message.to }]
            }],
            "from": { "email": message.from },
            "subject": message.subject,
            "content": [{
                "type": "text/plain",
                "value": message.body
            }]
        });

        if !attachments.is_empty() {
            body["attachments"] = serde_json::Value::Array(attachments);
        }

        let response = client
            .post("https://api.sendgrid.com/v3/mail/send")
            .header(
                "Authorization",
                format!("Bearer {}", self.config.sendgrid_api_key),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| EmailError::ProviderError(e.to_string()))?;

        if response.status().is_success() {
            info!(to = %message.to, subject = %message.subject, "Email sent via SendGrid");
            Ok(())
        } else {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            error!(status = %status, body = %text, "SendGrid rejected email");
            Err(EmailError::SendFailed(format!(
                "SendGrid returned {}: {}",
                status, text
            )))
        }
    }
}

#[async_trait]
impl Mailer for EmailService {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        if !self.config.enabled {
            debug!(
                to = %message.to,
                subject = %message.subject,
                "Email service disabled, skipping send"
            );
            return Ok(());
        }

        match self.config.provider.as_str() {
            "console" => self.send_console(message).await,
            "sendgrid" => self.send_sendgrid(message).await,
            provider => {
                error!(provider = %provider, "Unknown email provider");
                Err(EmailError::NotConfigured)
            }
        }
    }
}
