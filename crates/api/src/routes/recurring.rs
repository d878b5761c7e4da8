//! Recurring template endpoint handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use domain::models::recurring::{
    CreateTemplateRequest, RecurringLine, RecurringTemplate, UpdateTemplateRequest,
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::RunSummary;

/// Template together with its line set.
#[derive(Debug, Serialize)]
pub struct TemplateWithLines {
    #[serde(flatten)]
    pub template: RecurringTemplate,
    pub lines: Vec<RecurringLine>,
}

/// Optional body for a manual generation run.
#[derive(Debug, Default, Deserialize)]
pub struct RunRequest {
    /// Day to run as; defaults to today (UTC).
    pub date: Option<NaiveDate>,
}

/// Create a recurring template.
///
/// POST /api/v1/recurring
pub async fn create_template(
    State(state): State<AppState>,
    Json(request): Json<CreateTemplateRequest>,
) -> Result<(StatusCode, Json<TemplateWithLines>), ApiError> {
    request.validate()?;

    let (template, lines) = state.templates().create(&request).await?;
    Ok((
        StatusCode::CREATED,
        Json(TemplateWithLines {
            template: template.into(),
            lines: lines.into_iter().map(Into::into).collect(),
        }),
    ))
}

/// List all templates, newest first.
///
/// GET /api/v1/recurring
pub async fn list_templates(
    State(state): State<AppState>,
) -> Result<Json<Vec<RecurringTemplate>>, ApiError> {
    let templates = state.templates().list_all().await?;
    Ok(Json(templates.into_iter().map(Into::into).collect()))
}

/// Get one template with its lines.
///
/// GET /api/v1/recurring/:id
pub async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TemplateWithLines>, ApiError> {
    let repo = state.templates();
    let template = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Template {} not found", id)))?;
    let lines = repo.lines(id).await?;
    Ok(Json(TemplateWithLines {
        template: template.into(),
        lines: lines.into_iter().map(Into::into).collect(),
    }))
}

/// Partially update a template. A present `lines` field replaces the whole
/// line set.
///
/// PUT /api/v1/recurring/:id
pub async fn update_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<UpdateTemplateRequest>,
) -> Result<Json<TemplateWithLines>, ApiError> {
    patch.validate()?;

    let repo = state.templates();
    let template = repo
        .update(id, &patch)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Template {} not found", id)))?;
    let lines = repo.lines(id).await?;
    Ok(Json(TemplateWithLines {
        template: template.into(),
        lines: lines.into_iter().map(Into::into).collect(),
    }))
}

/// Delete a template and its lines. Idempotent.
///
/// DELETE /api/v1/recurring/:id
pub async fn delete_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.templates().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Flip a template's active flag.
///
/// POST /api/v1/recurring/:id/toggle
pub async fn toggle_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RecurringTemplate>, ApiError> {
    let template = state
        .templates()
        .toggle_active(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Template {} not found", id)))?;
    Ok(Json(template.into()))
}

/// Trigger a generation run immediately, without waiting for the daily job.
/// Safe to repeat: templates already generated this month are skipped.
///
/// POST /api/v1/recurring/run
pub async fn run_generation(
    State(state): State<AppState>,
    body: Option<Json<RunRequest>>,
) -> Result<Json<RunSummary>, ApiError> {
    let date = body
        .and_then(|Json(request)| request.date)
        .unwrap_or_else(|| Utc::now().date_naive());

    let summary = state.engine.run_once(date).await?;
    Ok(Json(summary))
}
