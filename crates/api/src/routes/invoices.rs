//! Invoice endpoint handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use domain::models::invoice::{CreateInvoiceRequest, Invoice, InvoiceLine, UpdateInvoiceRequest};

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::billing::DeliveryOutcome;

/// Invoice together with its line set.
#[derive(Debug, Serialize)]
pub struct InvoiceWithLines {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub lines: Vec<InvoiceLine>,
}

/// Response for the next-number preview.
#[derive(Debug, Serialize)]
pub struct NextNumberResponse {
    pub next_number: String,
}

/// Response for a manual send.
#[derive(Debug, Serialize)]
pub struct SendResponse {
    pub outcome: &'static str,
}

/// Create an invoice.
///
/// POST /api/v1/invoices
pub async fn create_invoice(
    State(state): State<AppState>,
    Json(request): Json<CreateInvoiceRequest>,
) -> Result<(StatusCode, Json<InvoiceWithLines>), ApiError> {
    request.validate()?;

    let (invoice, lines) = state.invoices().create(&request).await?;
    Ok((
        StatusCode::CREATED,
        Json(InvoiceWithLines {
            invoice: invoice.into(),
            lines: lines.into_iter().map(Into::into).collect(),
        }),
    ))
}

/// List all invoices, newest first. Headers only; lines are fetched per
/// invoice.
///
/// GET /api/v1/invoices
pub async fn list_invoices(State(state): State<AppState>) -> Result<Json<Vec<Invoice>>, ApiError> {
    let invoices = state.invoices().list_all().await?;
    Ok(Json(invoices.into_iter().map(Into::into).collect()))
}

/// Preview the next invoice number without consuming it.
///
/// GET /api/v1/invoices/next-number
pub async fn next_number(State(state): State<AppState>) -> Result<Json<NextNumberResponse>, ApiError> {
    let next_number = state.counter().preview_next().await?;
    Ok(Json(NextNumberResponse { next_number }))
}

/// Get one invoice with its lines.
///
/// GET /api/v1/invoices/:id
pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<InvoiceWithLines>, ApiError> {
    let repo = state.invoices();
    let invoice = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Invoice {} not found", id)))?;
    let lines = repo.lines(id).await?;
    Ok(Json(InvoiceWithLines {
        invoice: invoice.into(),
        lines: lines.into_iter().map(Into::into).collect(),
    }))
}

/// Partially update an invoice.
///
/// Two shapes are accepted: a line replacement (`lines` present, optionally
/// with new rates) or a metadata patch. Mixing both in one request is
/// rejected, as is changing rates without replacing lines, because stored
/// totals must always match the persisted lines and rates.
///
/// PUT /api/v1/invoices/:id
pub async fn update_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<UpdateInvoiceRequest>,
) -> Result<Json<InvoiceWithLines>, ApiError> {
    patch.validate()?;

    if patch.is_line_replacement() && patch.has_metadata_fields() {
        return Err(ApiError::Validation(
            "A single update may replace lines or patch metadata, not both".to_string(),
        ));
    }
    if !patch.is_line_replacement()
        && (patch.vat_rate.is_some() || patch.withholding_rate.is_some())
    {
        return Err(ApiError::Validation(
            "Rates can only change together with a line replacement".to_string(),
        ));
    }

    let repo = state.invoices();
    let invoice = repo
        .update(id, &patch)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Invoice {} not found", id)))?;
    let lines = repo.lines(id).await?;
    Ok(Json(InvoiceWithLines {
        invoice: invoice.into(),
        lines: lines.into_iter().map(Into::into).collect(),
    }))
}

/// Delete an invoice and its lines. Idempotent: deleting an unknown id
/// also answers 204.
///
/// DELETE /api/v1/invoices/:id
pub async fn delete_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.invoices().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Send an invoice to its client by email, on demand.
///
/// POST /api/v1/invoices/:id/send
pub async fn send_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SendResponse>, ApiError> {
    let repo = state.invoices();
    let invoice: Invoice = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Invoice {} not found", id)))?
        .into();
    let lines: Vec<InvoiceLine> = repo
        .lines(id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let contact = state
        .clients()
        .find_contact(invoice.client_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Client {} not found", invoice.client_id)))?
        .into();

    let outcome = state
        .engine
        .deliver_invoice(&invoice, &lines, &contact)
        .await?;

    Ok(Json(SendResponse {
        outcome: match outcome {
            DeliveryOutcome::Delivered => "delivered",
            DeliveryOutcome::Skipped => "skipped",
            DeliveryOutcome::Failed => "failed",
        },
    }))
}
