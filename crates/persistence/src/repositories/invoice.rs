//! Invoice aggregate repository.
//!
//! Owns the invoice header and its lines. Lines are only ever replaced as a
//! whole set inside a transaction, never patched individually, so the stored
//! totals always reflect the persisted lines and rates.

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use domain::models::invoice::{
    CreateInvoiceRequest, InvoiceStatus, NewInvoiceLine, UpdateInvoiceRequest,
};
use domain::services::totals::{compute_totals, line_total, LineAmount};

use crate::entities::{InvoiceEntity, InvoiceLineEntity, ScheduledInvoiceEntity};
use crate::metrics::QueryTimer;
use crate::repositories::CounterRepository;

const INVOICE_COLUMNS: &str = "id, number, client_id, project_id, issue_date, due_date, \
     subtotal, vat_rate, withholding_rate, total, status, scheduled_send_date, notes, created_at";

/// Repository for invoice-related database operations.
#[derive(Clone)]
pub struct InvoiceRepository {
    pool: PgPool,
    counter: CounterRepository,
}

impl InvoiceRepository {
    /// Creates a new InvoiceRepository with the given connection pool and
    /// number issuer.
    pub fn new(pool: PgPool, counter: CounterRepository) -> Self {
        Self { pool, counter }
    }

    /// Creates an invoice with its lines in one transaction.
    ///
    /// When the request carries no explicit number, the sequential issuer
    /// assigns the next one before the transaction starts. If any insert
    /// fails the whole creation rolls back; the consumed counter value then
    /// becomes a gap in the series, never a duplicate.
    pub async fn create(
        &self,
        request: &CreateInvoiceRequest,
    ) -> Result<(InvoiceEntity, Vec<InvoiceLineEntity>), sqlx::Error> {
        let number = match &request.number {
            Some(number) => number.clone(),
            None => self.counter.issue_next().await?,
        };

        let amounts: Vec<LineAmount> = request
            .lines
            .iter()
            .map(|line| LineAmount {
                quantity: line.quantity,
                unit_price: line.unit_price,
            })
            .collect();
        let totals = compute_totals(&amounts, request.vat_rate, request.withholding_rate);

        let status = request.status.unwrap_or(if request.scheduled_send_date.is_some() {
            InvoiceStatus::Scheduled
        } else {
            InvoiceStatus::Draft
        });

        let timer = QueryTimer::new("create_invoice");
        let mut tx = self.pool.begin().await?;

        let invoice = sqlx::query_as::<_, InvoiceEntity>(&format!(
            r#"
            INSERT INTO invoices (number, client_id, project_id, issue_date, due_date,
                                  subtotal, vat_rate, withholding_rate, total, status,
                                  scheduled_send_date, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {INVOICE_COLUMNS}
            "#
        ))
        .bind(&number)
        .bind(request.client_id)
        .bind(request.project_id)
        .bind(request.issue_date)
        .bind(request.due_date)
        .bind(totals.subtotal)
        .bind(request.vat_rate)
        .bind(request.withholding_rate)
        .bind(totals.total)
        .bind(status.as_str())
        .bind(request.scheduled_send_date)
        .bind(request.notes.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        let lines = insert_lines(&mut tx, invoice.id, &request.lines).await?;

        tx.commit().await?;
        timer.record();
        Ok((invoice, lines))
    }

    /// Finds an invoice by its opaque id.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<InvoiceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_invoice_by_id");
        let result = sqlx::query_as::<_, InvoiceEntity>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Lists all invoices, newest first.
    pub async fn list_all(&self) -> Result<Vec<InvoiceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_invoices");
        let result = sqlx::query_as::<_, InvoiceEntity>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Returns the lines of an invoice.
    pub async fn lines(&self, invoice_id: Uuid) -> Result<Vec<InvoiceLineEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_invoice_lines");
        let result = sqlx::query_as::<_, InvoiceLineEntity>(
            r#"
            SELECT id, invoice_id, concept, quantity, unit_price, line_total
            FROM invoice_lines
            WHERE invoice_id = $1
            ORDER BY id
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Applies a partial update to an invoice.
    ///
    /// A patch carrying `lines` replaces the whole line set and recomputes
    /// the stored totals atomically; any other patch only touches header
    /// metadata and leaves lines and totals untouched. Returns `None` when
    /// the invoice does not exist.
    pub async fn update(
        &self,
        id: Uuid,
        patch: &UpdateInvoiceRequest,
    ) -> Result<Option<InvoiceEntity>, sqlx::Error> {
        if let Some(lines) = &patch.lines {
            self.replace_lines(id, lines, patch.vat_rate, patch.withholding_rate)
                .await
        } else {
            self.update_metadata(id, patch).await
        }
    }

    async fn replace_lines(
        &self,
        id: Uuid,
        lines: &[NewInvoiceLine],
        vat_rate: Option<f64>,
        withholding_rate: Option<f64>,
    ) -> Result<Option<InvoiceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("replace_invoice_lines");
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, InvoiceEntity>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(current) = current else {
            return Ok(None);
        };

        let vat_rate = vat_rate.unwrap_or(current.vat_rate);
        let withholding_rate = withholding_rate.unwrap_or(current.withholding_rate);

        let amounts: Vec<LineAmount> = lines
            .iter()
            .map(|line| LineAmount {
                quantity: line.quantity,
                unit_price: line.unit_price,
            })
            .collect();
        let totals = compute_totals(&amounts, vat_rate, withholding_rate);

        let updated = sqlx::query_as::<_, InvoiceEntity>(&format!(
            r#"
            UPDATE invoices
            SET vat_rate = $2, withholding_rate = $3, subtotal = $4, total = $5
            WHERE id = $1
            RETURNING {INVOICE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(vat_rate)
        .bind(withholding_rate)
        .bind(totals.subtotal)
        .bind(totals.total)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM invoice_lines WHERE invoice_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        insert_lines(&mut tx, id, lines).await?;

        tx.commit().await?;
        timer.record();
        Ok(Some(updated))
    }

    async fn update_metadata(
        &self,
        id: Uuid,
        patch: &UpdateInvoiceRequest,
    ) -> Result<Option<InvoiceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_invoice_metadata");
        let result = sqlx::query_as::<_, InvoiceEntity>(&format!(
            r#"
            UPDATE invoices
            SET number = COALESCE($2, number),
                client_id = COALESCE($3, client_id),
                project_id = COALESCE($4, project_id),
                issue_date = COALESCE($5, issue_date),
                due_date = COALESCE($6, due_date),
                status = COALESCE($7, status),
                scheduled_send_date = COALESCE($8, scheduled_send_date),
                notes = COALESCE($9, notes)
            WHERE id = $1
            RETURNING {INVOICE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(patch.number.as_deref())
        .bind(patch.client_id)
        .bind(patch.project_id)
        .bind(patch.issue_date)
        .bind(patch.due_date)
        .bind(patch.status.map(|s| s.as_str()))
        .bind(patch.scheduled_send_date)
        .bind(patch.notes.as_deref())
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Sets the status of an invoice. Returns false when the id is unknown.
    pub async fn set_status(&self, id: Uuid, status: InvoiceStatus) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("set_invoice_status");
        let result = sqlx::query("UPDATE invoices SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await;
        timer.record();
        Ok(result?.rows_affected() > 0)
    }

    /// Deletes an invoice and its lines, lines first.
    ///
    /// Idempotent: deleting an already-deleted invoice is a no-op and
    /// returns false.
    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_invoice");
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM invoice_lines WHERE invoice_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM invoices WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        timer.record();
        Ok(deleted.rows_affected() > 0)
    }

    /// Returns scheduled invoices whose send date has arrived, joined with
    /// client contact info. Used by the batch send sweep.
    pub async fn find_due_scheduled(
        &self,
        on_or_before: NaiveDate,
    ) -> Result<Vec<ScheduledInvoiceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_due_scheduled_invoices");
        let result = sqlx::query_as::<_, ScheduledInvoiceEntity>(
            r#"
            SELECT i.id, i.number, i.client_id, i.project_id, i.issue_date, i.due_date,
                   i.subtotal, i.vat_rate, i.withholding_rate, i.total, i.status,
                   i.scheduled_send_date, i.notes, i.created_at,
                   c.name AS client_name, c.email AS client_email
            FROM invoices i
            JOIN clients c ON c.id = i.client_id
            WHERE i.status = 'scheduled' AND i.scheduled_send_date <= $1
            ORDER BY i.scheduled_send_date
            "#,
        )
        .bind(on_or_before)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Flips sent invoices past their due date to overdue. Returns the
    /// number of invoices updated.
    pub async fn mark_overdue(&self, today: NaiveDate) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("mark_invoices_overdue");
        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET status = 'overdue'
            WHERE status = 'sent' AND due_date IS NOT NULL AND due_date < $1
            "#,
        )
        .bind(today)
        .execute(&self.pool)
        .await;
        timer.record();
        Ok(result?.rows_affected())
    }
}

/// Inserts a line set for an invoice inside an open transaction.
async fn insert_lines(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    invoice_id: Uuid,
    lines: &[NewInvoiceLine],
) -> Result<Vec<InvoiceLineEntity>, sqlx::Error> {
    let mut inserted = Vec::with_capacity(lines.len());
    for line in lines {
        let entity = sqlx::query_as::<_, InvoiceLineEntity>(
            r#"
            INSERT INTO invoice_lines (invoice_id, concept, quantity, unit_price, line_total)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, invoice_id, concept, quantity, unit_price, line_total
            "#,
        )
        .bind(invoice_id)
        .bind(&line.concept)
        .bind(line.quantity)
        .bind(line.unit_price)
        .bind(line_total(line.quantity, line.unit_price))
        .fetch_one(&mut **tx)
        .await?;
        inserted.push(entity);
    }
    Ok(inserted)
}
