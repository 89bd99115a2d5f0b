use axum::{
    extract::State,
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use common::types::Page;
use models::{invoice, payment};
use service::invoices::{InvoiceInput, InvoiceUpdate, PaymentInput};
use service::pagination::Pagination;
use service::repository::InvoiceFilter;

use super::attachment;
use crate::auth::{CurrentUser, ServerState, ADMIN, MANAGEMENT};
use crate::errors::JsonApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};

#[derive(Debug, Serialize)]
pub struct PaymentRecorded {
    pub invoice: invoice::Model,
    pub payment: payment::Model,
}

#[derive(Debug, Serialize)]
pub struct OverdueSweep {
    pub updated: usize,
    pub invoices: Vec<invoice::Model>,
}

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/invoices", get(list).post(create))
        .route("/api/invoices/mark-overdue", post(mark_overdue))
        .route("/api/invoices/:id", get(get_one).patch(update).delete(remove))
        .route("/api/invoices/:id/issue", post(issue))
        .route("/api/invoices/:id/cancel", post(cancel))
        .route("/api/invoices/:id/payments", get(payments).post(record_payment))
        .route("/api/invoices/:id/pdf", get(pdf))
}

#[utoipa::path(get, path = "/api/invoices", tag = "invoices", responses((status = 200, description = "Page of invoices"), (status = 400, description = "from after to")))]
pub async fn list(
    State(state): State<ServerState>,
    ApiQuery(filter): ApiQuery<InvoiceFilter>,
    ApiQuery(page): ApiQuery<Pagination>,
) -> Result<Json<Page<invoice::Model>>, JsonApiError> {
    Ok(Json(state.services.invoices.list(filter, page).await?))
}

#[utoipa::path(get, path = "/api/invoices/{id}", tag = "invoices", params(("id" = Uuid, Path, description = "Invoice id")), responses((status = 200, description = "Invoice"), (status = 404, description = "Not found")))]
pub async fn get_one(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<Json<invoice::Model>, JsonApiError> {
    Ok(Json(state.services.invoices.get(id).await?))
}

#[utoipa::path(post, path = "/api/invoices", tag = "invoices", responses((status = 201, description = "Created with computed totals"), (status = 400, description = "Invalid items or unknown client")))]
pub async fn create(State(state): State<ServerState>, ApiJson(input): ApiJson<InvoiceInput>) -> Result<(StatusCode, Json<invoice::Model>), JsonApiError> {
    Ok((StatusCode::CREATED, Json(state.services.invoices.create(input).await?)))
}

#[utoipa::path(patch, path = "/api/invoices/{id}", tag = "invoices", params(("id" = Uuid, Path, description = "Invoice id")), responses((status = 200, description = "Updated"), (status = 409, description = "Not editable")))]
pub async fn update(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(upd): ApiJson<InvoiceUpdate>,
) -> Result<Json<invoice::Model>, JsonApiError> {
    Ok(Json(state.services.invoices.update(id, upd).await?))
}

#[utoipa::path(delete, path = "/api/invoices/{id}", tag = "invoices", params(("id" = Uuid, Path, description = "Invoice id")), responses((status = 204, description = "Deleted"), (status = 409, description = "Only draft or cancelled invoices")))]
pub async fn remove(State(state): State<ServerState>, user: CurrentUser, ApiPath(id): ApiPath<Uuid>) -> Result<StatusCode, JsonApiError> {
    user.require(ADMIN)?;
    state.services.invoices.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(post, path = "/api/invoices/{id}/issue", tag = "invoices", params(("id" = Uuid, Path, description = "Invoice id")), responses((status = 200, description = "Issued"), (status = 409, description = "Not a draft")))]
pub async fn issue(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<Json<invoice::Model>, JsonApiError> {
    Ok(Json(state.services.invoices.issue(id).await?))
}

#[utoipa::path(post, path = "/api/invoices/{id}/cancel", tag = "invoices", params(("id" = Uuid, Path, description = "Invoice id")), responses((status = 200, description = "Cancelled"), (status = 409, description = "Payments recorded")))]
pub async fn cancel(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<Json<invoice::Model>, JsonApiError> {
    Ok(Json(state.services.invoices.cancel(id).await?))
}

#[utoipa::path(get, path = "/api/invoices/{id}/payments", tag = "invoices", params(("id" = Uuid, Path, description = "Invoice id")), responses((status = 200, description = "Payments of the invoice")))]
pub async fn payments(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<Json<Vec<payment::Model>>, JsonApiError> {
    Ok(Json(state.services.invoices.payments(id).await?))
}

#[utoipa::path(post, path = "/api/invoices/{id}/payments", tag = "invoices", params(("id" = Uuid, Path, description = "Invoice id")), responses((status = 201, description = "Payment recorded"), (status = 400, description = "Amount not positive or above balance"), (status = 409, description = "Draft, cancelled or paid invoice")))]
pub async fn record_payment(
    State(state): State<ServerState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<PaymentInput>,
) -> Result<(StatusCode, Json<PaymentRecorded>), JsonApiError> {
    let (invoice, payment) = state.services.invoices.record_payment(id, Some(user.0.uid), input).await?;
    Ok((StatusCode::CREATED, Json(PaymentRecorded { invoice, payment })))
}

#[utoipa::path(post, path = "/api/invoices/mark-overdue", tag = "invoices", responses((status = 200, description = "Invoices moved to overdue")))]
pub async fn mark_overdue(State(state): State<ServerState>, user: CurrentUser) -> Result<Json<OverdueSweep>, JsonApiError> {
    user.require(MANAGEMENT)?;
    let invoices = state.services.invoices.mark_overdue(chrono::Utc::now().date_naive()).await?;
    Ok(Json(OverdueSweep { updated: invoices.len(), invoices }))
}

#[utoipa::path(get, path = "/api/invoices/{id}/pdf", tag = "invoices", params(("id" = Uuid, Path, description = "Invoice id")), responses((status = 200, description = "PDF document")))]
pub async fn pdf(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<Response, JsonApiError> {
    let (filename, bytes) = state.services.invoices.pdf(id).await?;
    Ok(attachment("application/pdf", filename, bytes))
}
