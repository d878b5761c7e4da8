//! Recurring billing engine.
//!
//! Materializes invoices from due templates and delivers them by email.
//! The ordering contract is strict: an invoice is durably created before its
//! template's watermark is advanced, and the watermark is advanced before
//! delivery is attempted. A failed delivery therefore never blocks the
//! month's generation, and a failed generation never falsely consumes the
//! month.

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use domain::models::client::ClientContact;
use domain::models::company::CompanyProfile;
use domain::models::email_log::NewEmailLogEntry;
use domain::models::invoice::{
    CreateInvoiceRequest, Invoice, InvoiceLine, InvoiceStatus, NewInvoiceLine,
};
use domain::models::recurring::{RecurringLine, RecurringTemplate};
use domain::services::templating::{render_template, PlaceholderValues};
use shared::dates::due_date_for;
use shared::money::format_amount;

use persistence::repositories::{
    ClientRepository, EmailLogRepository, InvoiceRepository, RecurringTemplateRepository,
};

use crate::services::email::{EmailAttachment, EmailMessage, Mailer};
use crate::services::pdf::PdfRenderer;

use super::email::EmailService;
use super::pdf::PdfService;

/// Errors surfaced by the billing engine.
///
/// Only storage failures are fatal to an operation; delivery failures are
/// absorbed into the run summary and the email log.
#[derive(Debug, Error)]
pub enum BillingError {
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<sqlx::Error> for BillingError {
    fn from(err: sqlx::Error) -> Self {
        BillingError::Storage(err.to_string())
    }
}

/// Persistence surface the engine runs against.
///
/// Production uses [`PgBillingStore`]; tests substitute an in-memory store.
#[async_trait]
pub trait BillingStore: Send + Sync {
    /// Active templates triggering on `day` whose watermark is not already
    /// in the calendar month of `today`.
    async fn due_templates(
        &self,
        day: i32,
        today: NaiveDate,
    ) -> Result<Vec<RecurringTemplate>, BillingError>;

    async fn template_lines(&self, template_id: Uuid) -> Result<Vec<RecurringLine>, BillingError>;

    /// Creates the invoice and its lines atomically, issuing a sequential
    /// number.
    async fn create_invoice(
        &self,
        request: &CreateInvoiceRequest,
    ) -> Result<(Invoice, Vec<InvoiceLine>), BillingError>;

    /// Advances the template watermark. Only called after `create_invoice`
    /// has committed.
    async fn mark_generated(&self, template_id: Uuid, date: NaiveDate)
        -> Result<(), BillingError>;

    async fn client_contact(&self, id: Uuid) -> Result<Option<ClientContact>, BillingError>;

    async fn set_invoice_status(
        &self,
        id: Uuid,
        status: InvoiceStatus,
    ) -> Result<(), BillingError>;

    async fn record_email(&self, entry: &NewEmailLogEntry) -> Result<(), BillingError>;
}

/// Postgres-backed store delegating to the repositories.
#[derive(Clone)]
pub struct PgBillingStore {
    invoices: InvoiceRepository,
    templates: RecurringTemplateRepository,
    clients: ClientRepository,
    email_log: EmailLogRepository,
}

impl PgBillingStore {
    pub fn new(
        invoices: InvoiceRepository,
        templates: RecurringTemplateRepository,
        clients: ClientRepository,
        email_log: EmailLogRepository,
    ) -> Self {
        Self {
            invoices,
            templates,
            clients,
            email_log,
        }
    }
}

#[async_trait]
impl BillingStore for PgBillingStore {
    async fn due_templates(
        &self,
        day: i32,
        today: NaiveDate,
    ) -> Result<Vec<RecurringTemplate>, BillingError> {
        let entities = self.templates.find_due_for_generation(day, today).await?;
        Ok(entities.into_iter().map(Into::into).collect())
    }

    async fn template_lines(&self, template_id: Uuid) -> Result<Vec<RecurringLine>, BillingError> {
        let entities = self.templates.lines(template_id).await?;
        Ok(entities.into_iter().map(Into::into).collect())
    }

    async fn create_invoice(
        &self,
        request: &CreateInvoiceRequest,
    ) -> Result<(Invoice, Vec<InvoiceLine>), BillingError> {
        let (invoice, lines) = self.invoices.create(request).await?;
        Ok((
            invoice.into(),
            lines.into_iter().map(Into::into).collect(),
        ))
    }

    async fn mark_generated(
        &self,
        template_id: Uuid,
        date: NaiveDate,
    ) -> Result<(), BillingError> {
        self.templates.mark_generated(template_id, date).await?;
        Ok(())
    }

    async fn client_contact(&self, id: Uuid) -> Result<Option<ClientContact>, BillingError> {
        let entity = self.clients.find_contact(id).await?;
        Ok(entity.map(Into::into))
    }

    async fn set_invoice_status(
        &self,
        id: Uuid,
        status: InvoiceStatus,
    ) -> Result<(), BillingError> {
        self.invoices.set_status(id, status).await?;
        Ok(())
    }

    async fn record_email(&self, entry: &NewEmailLogEntry) -> Result<(), BillingError> {
        self.email_log.record(entry).await?;
        Ok(())
    }
}

/// Result of one generation run.
#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    /// Invoices created in this run.
    pub generated: usize,
    /// Invoices emailed successfully.
    pub delivered: usize,
    /// Templates or deliveries that failed.
    pub failed: usize,
    /// Human-readable failure descriptions, one per failure.
    pub errors: Vec<String>,
}

/// Outcome of one delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Email sent; invoice marked sent.
    Delivered,
    /// Client has no usable address; nothing sent, nothing logged.
    Skipped,
    /// Render or send failed; an error entry was logged.
    Failed,
}

/// The engine, generic over its persistence and delivery surfaces so the
/// run semantics are testable without a database or SMTP.
pub struct RecurringBillingEngine<S, M, P> {
    store: S,
    mailer: M,
    pdf: P,
    company: CompanyProfile,
}

/// Production engine wiring.
pub type BillingEngine = RecurringBillingEngine<PgBillingStore, EmailService, PdfService>;

impl<S, M, P> RecurringBillingEngine<S, M, P>
where
    S: BillingStore,
    M: Mailer,
    P: PdfRenderer,
{
    pub fn new(store: S, mailer: M, pdf: P, company: CompanyProfile) -> Self {
        Self {
            store,
            mailer,
            pdf,
            company,
        }
    }

    /// Runs one generation pass for `today`.
    ///
    /// Each due template is processed independently: a failure is recorded
    /// in the summary and the run moves on to the next template. Running
    /// twice on the same day generates nothing the second time, because the
    /// first run advanced every successful template's watermark into the
    /// current month.
    pub async fn run_once(&self, today: NaiveDate) -> Result<RunSummary, BillingError> {
        let day = today.day() as i32;
        let templates = self.store.due_templates(day, today).await?;

        info!(day, due = templates.len(), "Recurring billing run started");

        let mut summary = RunSummary::default();
        for template in &templates {
            match self.generate_for_template(template, today).await {
                Ok(Some(outcome)) => {
                    summary.generated += 1;
                    match outcome {
                        DeliveryOutcome::Delivered => summary.delivered += 1,
                        DeliveryOutcome::Skipped => {}
                        DeliveryOutcome::Failed => {
                            summary.failed += 1;
                            summary
                                .errors
                                .push(format!("template {}: delivery failed", template.id));
                        }
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    error!(template_id = %template.id, error = %err, "Template generation failed");
                    summary.failed += 1;
                    summary.errors.push(format!("template {}: {}", template.id, err));
                }
            }
        }

        info!(
            generated = summary.generated,
            delivered = summary.delivered,
            failed = summary.failed,
            "Recurring billing run finished"
        );
        Ok(summary)
    }

    /// Generates and delivers one template's invoice.
    ///
    /// Returns `Ok(None)` when the template was skipped without generating
    /// anything (no lines).
    async fn generate_for_template(
        &self,
        template: &RecurringTemplate,
        today: NaiveDate,
    ) -> Result<Option<DeliveryOutcome>, BillingError> {
        let lines = self.store.template_lines(template.id).await?;
        if lines.is_empty() {
            warn!(template_id = %template.id, "Template has no lines, skipping");
            return Ok(None);
        }

        let request = CreateInvoiceRequest {
            client_id: template.client_id,
            project_id: template.project_id,
            number: None,
            issue_date: today,
            due_date: Some(due_date_for(today)),
            vat_rate: template.vat_rate,
            withholding_rate: template.withholding_rate,
            lines: lines
                .iter()
                .map(|line| NewInvoiceLine {
                    concept: line.concept.clone(),
                    quantity: line.quantity.unwrap_or(1.0),
                    unit_price: line.unit_price,
                })
                .collect(),
            notes: template.notes.clone(),
            status: None,
            scheduled_send_date: None,
        };

        let (invoice, invoice_lines) = self.store.create_invoice(&request).await?;
        info!(
            template_id = %template.id,
            invoice = %invoice.number,
            total = invoice.total,
            "Invoice generated from template"
        );

        // The invoice is committed; the month is consumed even if everything
        // after this point fails. An undelivered invoice is re-sent through
        // POST /invoices/{id}/send, never by regenerating.
        self.store.mark_generated(template.id, today).await?;

        let Some(contact) = self.store.client_contact(invoice.client_id).await? else {
            warn!(invoice = %invoice.number, "Client not found, skipping delivery");
            return Ok(Some(DeliveryOutcome::Skipped));
        };

        let outcome = self
            .deliver_invoice(&invoice, &invoice_lines, &contact)
            .await?;
        Ok(Some(outcome))
    }

    /// Emails one invoice to its client, with the rendered PDF attached when
    /// rendering is enabled.
    ///
    /// A client without a usable address is a silent skip. A render or send
    /// failure is logged to the email log and reported in the outcome, never
    /// propagated as an error.
    pub async fn deliver_invoice(
        &self,
        invoice: &Invoice,
        lines: &[InvoiceLine],
        contact: &ClientContact,
    ) -> Result<DeliveryOutcome, BillingError> {
        if !contact.has_usable_email() {
            debug!(invoice = %invoice.number, client = %contact.name, "No usable email, skipping delivery");
            return Ok(DeliveryOutcome::Skipped);
        }
        let recipient = contact.email.as_deref().unwrap_or_default();

        let total = format_amount(invoice.total);
        let date = invoice.issue_date.to_string();
        let values = PlaceholderValues {
            company: &self.company.name,
            client: &contact.name,
            number: &invoice.number,
            total: &total,
            date: &date,
        };
        let subject = render_template(&self.company.email_subject_template, &values);
        let body = render_template(&self.company.email_body_template, &values);

        let attachments = match self.pdf.render(invoice, lines).await {
            Ok(Some(data)) => vec![EmailAttachment {
                filename: format!("factura-{}.pdf", invoice.number),
                content_type: "application/pdf".to_string(),
                data,
            }],
            Ok(None) => vec![],
            Err(err) => {
                error!(invoice = %invoice.number, error = %err, "PDF rendering failed");
                self.store
                    .record_email(&NewEmailLogEntry::failed(
                        invoice.id,
                        &invoice.number,
                        recipient,
                        &subject,
                        &err.to_string(),
                    ))
                    .await?;
                return Ok(DeliveryOutcome::Failed);
            }
        };

        let message = EmailMessage {
            to: recipient.to_string(),
            from: self.company.email.clone(),
            subject: subject.clone(),
            body,
            attachments,
        };

        match self.mailer.send(message).await {
            Ok(()) => {
                self.store
                    .record_email(&NewEmailLogEntry::sent(
                        invoice.id,
                        &invoice.number,
                        recipient,
                        &subject,
                    ))
                    .await?;
                self.store
                    .set_invoice_status(invoice.id, InvoiceStatus::Sent)
                    .await?;
                info!(invoice = %invoice.number, to = %recipient, "Invoice delivered");
                Ok(DeliveryOutcome::Delivered)
            }
            Err(err) => {
                error!(invoice = %invoice.number, error = %err, "Invoice delivery failed");
                self.store
                    .record_email(&NewEmailLogEntry::failed(
                        invoice.id,
                        &invoice.number,
                        recipient,
                        &subject,
                        &err.to_string(),
                    ))
                    .await?;
                Ok(DeliveryOutcome::Failed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::email::EmailError;
    use crate::services::pdf::PdfError;
    use chrono::Utc;
    use domain::models::email_log::EmailOutcome;
    use shared::dates::same_calendar_month;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// In-memory store mirroring the month-watermark semantics of the real
    /// queries, plus an event trail for ordering assertions.
    #[derive(Default)]
    struct MemoryStore {
        templates: Mutex<Vec<RecurringTemplate>>,
        lines: Mutex<Vec<RecurringLine>>,
        contacts: Mutex<Vec<ClientContact>>,
        invoices: Mutex<Vec<Invoice>>,
        email_log: Mutex<Vec<NewEmailLogEntry>>,
        events: Mutex<Vec<String>>,
        fail_create_for: Mutex<HashSet<Uuid>>,
        next_number: Mutex<i64>,
    }

    impl MemoryStore {
        fn add_template(&self, template: RecurringTemplate, lines: Vec<(&str, Option<f64>, f64)>) {
            for (concept, quantity, unit_price) in lines {
                self.lines.lock().unwrap().push(RecurringLine {
                    id: Uuid::new_v4(),
                    template_id: template.id,
                    concept: concept.to_string(),
                    quantity,
                    unit_price,
                });
            }
            self.templates.lock().unwrap().push(template);
        }

        fn add_contact(&self, contact: ClientContact) {
            self.contacts.lock().unwrap().push(contact);
        }

        fn fail_create(&self, template_client: Uuid) {
            self.fail_create_for.lock().unwrap().insert(template_client);
        }

        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BillingStore for MemoryStore {
        async fn due_templates(
            &self,
            day: i32,
            today: NaiveDate,
        ) -> Result<Vec<RecurringTemplate>, BillingError> {
            Ok(self
                .templates
                .lock()
                .unwrap()
                .iter()
                .filter(|t| {
                    t.active
                        && t.day_of_month == day
                        && !t
                            .last_generation_date
                            .map(|d| same_calendar_month(d, today))
                            .unwrap_or(false)
                })
                .cloned()
                .collect())
        }

        async fn template_lines(
            &self,
            template_id: Uuid,
        ) -> Result<Vec<RecurringLine>, BillingError> {
            Ok(self
                .lines
                .lock()
                .unwrap()
                .iter()
                .filter(|l| l.template_id == template_id)
                .cloned()
                .collect())
        }

        async fn create_invoice(
            &self,
            request: &CreateInvoiceRequest,
        ) -> Result<(Invoice, Vec<InvoiceLine>), BillingError> {
            if self
                .fail_create_for
                .lock()
                .unwrap()
                .contains(&request.client_id)
            {
                return Err(BillingError::Storage("insert failed".to_string()));
            }

            let number = {
                let mut next = self.next_number.lock().unwrap();
                *next += 1;
                next.to_string()
            };

            let amounts: Vec<domain::services::totals::LineAmount> = request
                .lines
                .iter()
                .map(|l| domain::services::totals::LineAmount {
                    quantity: l.quantity,
                    unit_price: l.unit_price,
                })
                .collect();
            let totals = domain::services::totals::compute_totals(
                &amounts,
                request.vat_rate,
                request.withholding_rate,
            );

            let invoice = Invoice {
                id: Uuid::new_v4(),
                number,
                client_id: request.client_id,
                project_id: request.project_id,
                issue_date: request.issue_date,
                due_date: request.due_date,
                subtotal: totals.subtotal,
                vat_rate: request.vat_rate,
                withholding_rate: request.withholding_rate,
                total: totals.total,
                status: InvoiceStatus::Draft,
                scheduled_send_date: None,
                notes: request.notes.clone(),
                created_at: Utc::now(),
            };
            let lines = request
                .lines
                .iter()
                .map(|l| InvoiceLine {
                    id: Uuid::new_v4(),
                    invoice_id: invoice.id,
                    concept: l.concept.clone(),
                    quantity: l.quantity,
                    unit_price: l.unit_price,
                    line_total: domain::services::totals::line_total(l.quantity, l.unit_price),
                })
                .collect();

            self.invoices.lock().unwrap().push(invoice.clone());
            self.events
                .lock()
                .unwrap()
                .push(format!("create:{}", invoice.number));
            Ok((invoice, lines))
        }

        async fn mark_generated(
            &self,
            template_id: Uuid,
            date: NaiveDate,
        ) -> Result<(), BillingError> {
            for template in self.templates.lock().unwrap().iter_mut() {
                if template.id == template_id {
                    template.last_generation_date = Some(date);
                }
            }
            self.events
                .lock()
                .unwrap()
                .push(format!("mark:{}", template_id));
            Ok(())
        }

        async fn client_contact(&self, id: Uuid) -> Result<Option<ClientContact>, BillingError> {
            Ok(self
                .contacts
                .lock()
                .unwrap()
                .iter()
                .find(|c| c.id == id)
                .cloned())
        }

        async fn set_invoice_status(
            &self,
            id: Uuid,
            status: InvoiceStatus,
        ) -> Result<(), BillingError> {
            for invoice in self.invoices.lock().unwrap().iter_mut() {
                if invoice.id == id {
                    invoice.status = status;
                }
            }
            Ok(())
        }

        async fn record_email(&self, entry: &NewEmailLogEntry) -> Result<(), BillingError> {
            self.email_log.lock().unwrap().push(entry.clone());
            Ok(())
        }
    }

    struct StubMailer {
        fail: bool,
        sent: Mutex<Vec<EmailMessage>>,
    }

    impl StubMailer {
        fn new(fail: bool) -> Self {
            Self {
                fail,
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Mailer for StubMailer {
        async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
            if self.fail {
                return Err(EmailError::SendFailed("smtp unreachable".to_string()));
            }
            self.sent.lock().unwrap().push(message);
            Ok(())
        }
    }

    struct NoPdf;

    #[async_trait]
    impl PdfRenderer for NoPdf {
        async fn render(
            &self,
            _invoice: &Invoice,
            _lines: &[InvoiceLine],
        ) -> Result<Option<Vec<u8>>, PdfError> {
            Ok(None)
        }
    }

    struct FailingPdf;

    #[async_trait]
    impl PdfRenderer for FailingPdf {
        async fn render(
            &self,
            _invoice: &Invoice,
            _lines: &[InvoiceLine],
        ) -> Result<Option<Vec<u8>>, PdfError> {
            Err(PdfError::RequestFailed("renderer down".to_string()))
        }
    }

    fn company() -> CompanyProfile {
        serde_json::from_str(r#"{"name": "Estudio Norte", "email": "hola@estudionorte.example"}"#)
            .unwrap()
    }

    fn template(client_id: Uuid, day: i32) -> RecurringTemplate {
        RecurringTemplate {
            id: Uuid::new_v4(),
            client_id,
            project_id: None,
            day_of_month: day,
            vat_rate: 21.0,
            withholding_rate: 15.0,
            notes: None,
            active: true,
            last_generation_date: None,
            created_at: Utc::now(),
        }
    }

    fn contact(id: Uuid, email: Option<&str>) -> ClientContact {
        ClientContact {
            id,
            name: "Acme S.L.".to_string(),
            email: email.map(String::from),
        }
    }

    fn engine<M: Mailer, P: PdfRenderer>(
        store: MemoryStore,
        mailer: M,
        pdf: P,
    ) -> RecurringBillingEngine<MemoryStore, M, P> {
        RecurringBillingEngine::new(store, mailer, pdf, company())
    }

    fn march_15() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
    }

    #[tokio::test]
    async fn test_generates_and_delivers_due_template() {
        let store = MemoryStore::default();
        let client_id = Uuid::new_v4();
        store.add_template(template(client_id, 15), vec![("Retainer", Some(2.0), 50.0)]);
        store.add_contact(contact(client_id, Some("billing@acme.example")));

        let engine = engine(store, StubMailer::new(false), NoPdf);
        let summary = engine.run_once(march_15()).await.unwrap();

        assert_eq!(summary.generated, 1);
        assert_eq!(summary.delivered, 1);
        assert_eq!(summary.failed, 0);

        let invoices = engine.store.invoices.lock().unwrap();
        assert_eq!(invoices.len(), 1);
        assert_eq!(invoices[0].subtotal, 100.0);
        assert_eq!(invoices[0].total, 106.0);
        assert_eq!(invoices[0].status, InvoiceStatus::Sent);
        assert_eq!(
            invoices[0].due_date,
            Some(NaiveDate::from_ymd_opt(2026, 4, 14).unwrap())
        );
    }

    #[tokio::test]
    async fn test_invoice_created_before_watermark_advanced() {
        let store = MemoryStore::default();
        let client_id = Uuid::new_v4();
        store.add_template(template(client_id, 15), vec![("Retainer", None, 800.0)]);
        store.add_contact(contact(client_id, Some("billing@acme.example")));

        let engine = engine(store, StubMailer::new(false), NoPdf);
        engine.run_once(march_15()).await.unwrap();

        let events = engine.store.events();
        assert!(events[0].starts_with("create:"));
        assert!(events[1].starts_with("mark:"));
    }

    #[tokio::test]
    async fn test_second_run_same_day_generates_nothing() {
        let store = MemoryStore::default();
        let client_id = Uuid::new_v4();
        store.add_template(template(client_id, 15), vec![("Retainer", None, 800.0)]);
        store.add_contact(contact(client_id, Some("billing@acme.example")));

        let engine = engine(store, StubMailer::new(false), NoPdf);
        let first = engine.run_once(march_15()).await.unwrap();
        let second = engine.run_once(march_15()).await.unwrap();

        assert_eq!(first.generated, 1);
        assert_eq!(second.generated, 0);
        assert_eq!(engine.store.invoices.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_same_template_generates_again_next_month() {
        let store = MemoryStore::default();
        let client_id = Uuid::new_v4();
        let mut t = template(client_id, 15);
        t.last_generation_date = Some(NaiveDate::from_ymd_opt(2026, 2, 15).unwrap());
        store.add_template(t, vec![("Retainer", None, 800.0)]);
        store.add_contact(contact(client_id, Some("billing@acme.example")));

        let engine = engine(store, StubMailer::new(false), NoPdf);
        let summary = engine.run_once(march_15()).await.unwrap();
        assert_eq!(summary.generated, 1);
    }

    #[tokio::test]
    async fn test_failed_template_does_not_block_others() {
        let store = MemoryStore::default();
        let failing_client = Uuid::new_v4();
        let healthy_client = Uuid::new_v4();
        store.add_template(template(failing_client, 15), vec![("Retainer", None, 500.0)]);
        store.add_template(template(healthy_client, 15), vec![("Retainer", None, 800.0)]);
        store.add_contact(contact(healthy_client, Some("billing@acme.example")));
        store.fail_create(failing_client);

        let engine = engine(store, StubMailer::new(false), NoPdf);
        let summary = engine.run_once(march_15()).await.unwrap();

        assert_eq!(summary.generated, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.errors.len(), 1);

        // The failing template keeps its month: no watermark was set, so the
        // next run retries it.
        let templates = engine.store.templates.lock().unwrap();
        let failing = templates
            .iter()
            .find(|t| t.client_id == failing_client)
            .unwrap();
        assert!(failing.last_generation_date.is_none());
    }

    #[tokio::test]
    async fn test_delivery_failure_keeps_invoice_and_watermark() {
        let store = MemoryStore::default();
        let client_id = Uuid::new_v4();
        store.add_template(template(client_id, 15), vec![("Retainer", None, 800.0)]);
        store.add_contact(contact(client_id, Some("billing@acme.example")));

        let engine = engine(store, StubMailer::new(true), NoPdf);
        let summary = engine.run_once(march_15()).await.unwrap();

        assert_eq!(summary.generated, 1);
        assert_eq!(summary.delivered, 0);
        assert_eq!(summary.failed, 1);

        let invoices = engine.store.invoices.lock().unwrap();
        assert_eq!(invoices.len(), 1);
        assert_eq!(invoices[0].status, InvoiceStatus::Draft);

        let templates = engine.store.templates.lock().unwrap();
        assert_eq!(templates[0].last_generation_date, Some(march_15()));

        let log = engine.store.email_log.lock().unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].outcome, EmailOutcome::Error);
        assert_eq!(log[0].error_message.as_deref(), Some("Failed to send email: smtp unreachable"));
    }

    #[tokio::test]
    async fn test_client_without_email_is_skipped_silently() {
        let store = MemoryStore::default();
        let client_id = Uuid::new_v4();
        store.add_template(template(client_id, 15), vec![("Retainer", None, 800.0)]);
        store.add_contact(contact(client_id, None));

        let engine = engine(store, StubMailer::new(false), NoPdf);
        let summary = engine.run_once(march_15()).await.unwrap();

        assert_eq!(summary.generated, 1);
        assert_eq!(summary.delivered, 0);
        assert_eq!(summary.failed, 0);
        assert!(engine.store.email_log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pdf_failure_logged_and_not_fatal() {
        let store = MemoryStore::default();
        let client_id = Uuid::new_v4();
        store.add_template(template(client_id, 15), vec![("Retainer", None, 800.0)]);
        store.add_contact(contact(client_id, Some("billing@acme.example")));

        let engine = engine(store, StubMailer::new(false), FailingPdf);
        let summary = engine.run_once(march_15()).await.unwrap();

        assert_eq!(summary.generated, 1);
        assert_eq!(summary.failed, 1);

        let log = engine.store.email_log.lock().unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].outcome, EmailOutcome::Error);
    }

    #[tokio::test]
    async fn test_line_quantity_defaults_to_one() {
        let store = MemoryStore::default();
        let client_id = Uuid::new_v4();
        store.add_template(template(client_id, 15), vec![("Retainer", None, 800.0)]);
        store.add_contact(contact(client_id, Some("billing@acme.example")));

        let engine = engine(store, StubMailer::new(false), NoPdf);
        engine.run_once(march_15()).await.unwrap();

        let invoices = engine.store.invoices.lock().unwrap();
        assert_eq!(invoices[0].subtotal, 800.0);
    }

    #[tokio::test]
    async fn test_inactive_and_wrong_day_templates_not_due() {
        let store = MemoryStore::default();
        let client_id = Uuid::new_v4();
        let mut inactive = template(client_id, 15);
        inactive.active = false;
        store.add_template(inactive, vec![("Retainer", None, 800.0)]);
        store.add_template(template(client_id, 20), vec![("Retainer", None, 800.0)]);

        let engine = engine(store, StubMailer::new(false), NoPdf);
        let summary = engine.run_once(march_15()).await.unwrap();
        assert_eq!(summary.generated, 0);
    }

    #[tokio::test]
    async fn test_template_without_lines_is_skipped() {
        let store = MemoryStore::default();
        let client_id = Uuid::new_v4();
        store.add_template(template(client_id, 15), vec![]);

        let engine = engine(store, StubMailer::new(false), NoPdf);
        let summary = engine.run_once(march_15()).await.unwrap();

        assert_eq!(summary.generated, 0);
        assert_eq!(summary.failed, 0);
        // The month is not consumed.
        let templates = engine.store.templates.lock().unwrap();
        assert!(templates[0].last_generation_date.is_none());
    }

    #[tokio::test]
    async fn test_email_uses_company_templates() {
        let store = MemoryStore::default();
        let client_id = Uuid::new_v4();
        store.add_template(template(client_id, 15), vec![("Retainer", Some(2.0), 50.0)]);
        store.add_contact(contact(client_id, Some("billing@acme.example")));

        let mailer = StubMailer::new(false);
        let engine = engine(store, mailer, NoPdf);
        engine.run_once(march_15()).await.unwrap();

        let sent = engine.mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Factura 1 - Estudio Norte");
        assert!(sent[0].body.contains("Acme S.L."));
        assert!(sent[0].body.contains("106.00"));
    }
}
