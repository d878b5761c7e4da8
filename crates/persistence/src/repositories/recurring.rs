//! Recurring template repository.
//!
//! Owns templates and their lines, the "due today" query and the
//! generation watermark.

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use domain::models::recurring::{CreateTemplateRequest, NewRecurringLine, UpdateTemplateRequest};

use crate::entities::{RecurringLineEntity, RecurringTemplateEntity};
use crate::metrics::QueryTimer;

const TEMPLATE_COLUMNS: &str = "id, client_id, project_id, day_of_month, vat_rate, \
     withholding_rate, notes, active, last_generation_date, created_at";

/// Repository for recurring-template database operations.
#[derive(Clone)]
pub struct RecurringTemplateRepository {
    pool: PgPool,
}

impl RecurringTemplateRepository {
    /// Creates a new RecurringTemplateRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a template with its lines in one transaction.
    pub async fn create(
        &self,
        request: &CreateTemplateRequest,
    ) -> Result<(RecurringTemplateEntity, Vec<RecurringLineEntity>), sqlx::Error> {
        let timer = QueryTimer::new("create_recurring_template");
        let mut tx = self.pool.begin().await?;

        let template = sqlx::query_as::<_, RecurringTemplateEntity>(&format!(
            r#"
            INSERT INTO recurring_templates (client_id, project_id, day_of_month, vat_rate,
                                             withholding_rate, notes, active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {TEMPLATE_COLUMNS}
            "#
        ))
        .bind(request.client_id)
        .bind(request.project_id)
        .bind(request.day_of_month)
        .bind(request.vat_rate)
        .bind(request.withholding_rate)
        .bind(request.notes.as_deref())
        .bind(request.active)
        .fetch_one(&mut *tx)
        .await?;

        let lines = insert_lines(&mut tx, template.id, &request.lines).await?;

        tx.commit().await?;
        timer.record();
        Ok((template, lines))
    }

    /// Finds a template by id.
    pub async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<RecurringTemplateEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_template_by_id");
        let result = sqlx::query_as::<_, RecurringTemplateEntity>(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM recurring_templates WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Lists all templates, newest first.
    pub async fn list_all(&self) -> Result<Vec<RecurringTemplateEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_recurring_templates");
        let result = sqlx::query_as::<_, RecurringTemplateEntity>(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM recurring_templates ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Returns the lines of a template.
    pub async fn lines(&self, template_id: Uuid) -> Result<Vec<RecurringLineEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_template_lines");
        let result = sqlx::query_as::<_, RecurringLineEntity>(
            r#"
            SELECT id, template_id, concept, quantity, unit_price
            FROM recurring_lines
            WHERE template_id = $1
            ORDER BY id
            "#,
        )
        .bind(template_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Applies a partial update; a present `lines` field replaces the whole
    /// line set. `last_generation_date` is never touched here — the billing
    /// engine owns it.
    pub async fn update(
        &self,
        id: Uuid,
        patch: &UpdateTemplateRequest,
    ) -> Result<Option<RecurringTemplateEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_recurring_template");
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, RecurringTemplateEntity>(&format!(
            r#"
            UPDATE recurring_templates
            SET client_id = COALESCE($2, client_id),
                project_id = COALESCE($3, project_id),
                day_of_month = COALESCE($4, day_of_month),
                vat_rate = COALESCE($5, vat_rate),
                withholding_rate = COALESCE($6, withholding_rate),
                notes = COALESCE($7, notes),
                active = COALESCE($8, active)
            WHERE id = $1
            RETURNING {TEMPLATE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(patch.client_id)
        .bind(patch.project_id)
        .bind(patch.day_of_month)
        .bind(patch.vat_rate)
        .bind(patch.withholding_rate)
        .bind(patch.notes.as_deref())
        .bind(patch.active)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(updated) = updated else {
            return Ok(None);
        };

        if let Some(lines) = &patch.lines {
            sqlx::query("DELETE FROM recurring_lines WHERE template_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            insert_lines(&mut tx, id, lines).await?;
        }

        tx.commit().await?;
        timer.record();
        Ok(Some(updated))
    }

    /// Deletes a template and its lines. Idempotent.
    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_recurring_template");
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM recurring_lines WHERE template_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM recurring_templates WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        timer.record();
        Ok(deleted.rows_affected() > 0)
    }

    /// Flips the active flag. No other side effects.
    pub async fn toggle_active(
        &self,
        id: Uuid,
    ) -> Result<Option<RecurringTemplateEntity>, sqlx::Error> {
        let timer = QueryTimer::new("toggle_template_active");
        let result = sqlx::query_as::<_, RecurringTemplateEntity>(&format!(
            r#"
            UPDATE recurring_templates
            SET active = NOT active
            WHERE id = $1
            RETURNING {TEMPLATE_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Returns the active templates due for generation on the given trigger
    /// day.
    ///
    /// This is the idempotency guard: a template whose watermark already
    /// falls in the calendar month of `today` is excluded even if the query
    /// runs again the same day.
    pub async fn find_due_for_generation(
        &self,
        day_of_month: i32,
        today: NaiveDate,
    ) -> Result<Vec<RecurringTemplateEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_templates_due_for_generation");
        let result = sqlx::query_as::<_, RecurringTemplateEntity>(&format!(
            r#"
            SELECT {TEMPLATE_COLUMNS}
            FROM recurring_templates
            WHERE active = TRUE
              AND day_of_month = $1
              AND (last_generation_date IS NULL
                   OR date_trunc('month', last_generation_date) <> date_trunc('month', $2::date))
            ORDER BY created_at
            "#
        ))
        .bind(day_of_month)
        .bind(today)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Sets the generation watermark.
    ///
    /// Must be called only after the generated invoice is durably committed;
    /// the watermark means "an invoice was generated this month", not
    /// "delivery succeeded".
    pub async fn mark_generated(&self, id: Uuid, date: NaiveDate) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("mark_template_generated");
        let result = sqlx::query(
            "UPDATE recurring_templates SET last_generation_date = $2 WHERE id = $1",
        )
        .bind(id)
        .bind(date)
        .execute(&self.pool)
        .await;
        timer.record();
        Ok(result?.rows_affected() > 0)
    }
}

/// Inserts a line set for a template inside an open transaction.
async fn insert_lines(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    template_id: Uuid,
    lines: &[NewRecurringLine],
) -> Result<Vec<RecurringLineEntity>, sqlx::Error> {
    let mut inserted = Vec::with_capacity(lines.len());
    for line in lines {
        let entity = sqlx::query_as::<_, RecurringLineEntity>(
            r#"
            INSERT INTO recurring_lines (template_id, concept, quantity, unit_price)
            VALUES ($1, $2, $3, $4)
            RETURNING id, template_id, concept, quantity, unit_price
            "#,
        )
        .bind(template_id)
        .bind(&line.concept)
        .bind(line.quantity)
        .bind(line.unit_price)
        .fetch_one(&mut **tx)
        .await?;
        inserted.push(entity);
    }
    Ok(inserted)
}
