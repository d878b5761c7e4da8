//! Email delivery log endpoint handlers.

use axum::{extract::State, Json};

use domain::models::email_log::EmailLogEntry;

use crate::app::AppState;
use crate::error::ApiError;

/// List the email delivery log, newest first.
///
/// GET /api/v1/email-log
pub async fn list_email_log(
    State(state): State<AppState>,
) -> Result<Json<Vec<EmailLogEntry>>, ApiError> {
    let entries = state.email_log().list_all().await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}
