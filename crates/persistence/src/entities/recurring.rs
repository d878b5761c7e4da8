//! Recurring template entities (database row mappings).

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::recurring::{RecurringLine, RecurringTemplate};

/// Database row mapping for the recurring_templates table.
#[derive(Debug, Clone, FromRow)]
pub struct RecurringTemplateEntity {
    pub id: Uuid,
    pub client_id: Uuid,
    pub project_id: Option<Uuid>,
    pub day_of_month: i32,
    pub vat_rate: f64,
    pub withholding_rate: f64,
    pub notes: Option<String>,
    pub active: bool,
    pub last_generation_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl From<RecurringTemplateEntity> for RecurringTemplate {
    fn from(entity: RecurringTemplateEntity) -> Self {
        Self {
            id: entity.id,
            client_id: entity.client_id,
            project_id: entity.project_id,
            day_of_month: entity.day_of_month,
            vat_rate: entity.vat_rate,
            withholding_rate: entity.withholding_rate,
            notes: entity.notes,
            active: entity.active,
            last_generation_date: entity.last_generation_date,
            created_at: entity.created_at,
        }
    }
}

/// Database row mapping for the recurring_lines table.
#[derive(Debug, Clone, FromRow)]
pub struct RecurringLineEntity {
    pub id: Uuid,
    pub template_id: Uuid,
    pub concept: String,
    pub quantity: Option<f64>,
    pub unit_price: f64,
}

impl From<RecurringLineEntity> for RecurringLine {
    fn from(entity: RecurringLineEntity) -> Self {
        Self {
            id: entity.id,
            template_id: entity.template_id,
            concept: entity.concept,
            quantity: entity.quantity,
            unit_price: entity.unit_price,
        }
    }
}
