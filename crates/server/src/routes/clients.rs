use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use uuid::Uuid;

use common::types::Page;
use models::client;
use models::enums::{PaymentStatus, RepairStatus};
use service::clients::{ClientHistory, ClientInput, ClientPatch};
use service::pagination::Pagination;
use service::repository::ClientFilter;

use super::StatusUpdate;
use crate::auth::{CurrentUser, ServerState, MANAGEMENT};
use crate::errors::JsonApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/clients", get(list).post(create))
        .route("/api/clients/:id", get(get_one).patch(update).delete(remove))
        .route("/api/clients/:id/repair-status", patch(set_repair_status))
        .route("/api/clients/:id/payment-status", patch(set_payment_status))
        .route("/api/clients/:id/history", get(history))
}

#[utoipa::path(get, path = "/api/clients", tag = "clients", responses((status = 200, description = "Page of clients, newest first")))]
pub async fn list(
    State(state): State<ServerState>,
    ApiQuery(filter): ApiQuery<ClientFilter>,
    ApiQuery(page): ApiQuery<Pagination>,
) -> Result<Json<Page<client::Model>>, JsonApiError> {
    Ok(Json(state.services.clients.list(filter, page).await?))
}

#[utoipa::path(get, path = "/api/clients/{id}", tag = "clients", params(("id" = Uuid, Path, description = "Client id")), responses((status = 200, description = "Client"), (status = 404, description = "Not found")))]
pub async fn get_one(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<Json<client::Model>, JsonApiError> {
    Ok(Json(state.services.clients.get(id).await?))
}

#[utoipa::path(post, path = "/api/clients", tag = "clients", responses((status = 201, description = "Created"), (status = 400, description = "Invalid input"), (status = 409, description = "Duplicate plate")))]
pub async fn create(State(state): State<ServerState>, ApiJson(input): ApiJson<ClientInput>) -> Result<(StatusCode, Json<client::Model>), JsonApiError> {
    Ok((StatusCode::CREATED, Json(state.services.clients.create(input).await?)))
}

#[utoipa::path(patch, path = "/api/clients/{id}", tag = "clients", params(("id" = Uuid, Path, description = "Client id")), responses((status = 200, description = "Updated")))]
pub async fn update(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<ClientPatch>,
) -> Result<Json<client::Model>, JsonApiError> {
    Ok(Json(state.services.clients.update(id, patch).await?))
}

#[utoipa::path(delete, path = "/api/clients/{id}", tag = "clients", params(("id" = Uuid, Path, description = "Client id")), responses((status = 204, description = "Deleted"), (status = 409, description = "Client has invoices or budgets")))]
pub async fn remove(State(state): State<ServerState>, user: CurrentUser, ApiPath(id): ApiPath<Uuid>) -> Result<StatusCode, JsonApiError> {
    user.require(MANAGEMENT)?;
    state.services.clients.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(patch, path = "/api/clients/{id}/repair-status", tag = "clients", params(("id" = Uuid, Path, description = "Client id")), responses((status = 200, description = "Moved"), (status = 409, description = "Transition not allowed")))]
pub async fn set_repair_status(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<StatusUpdate<RepairStatus>>,
) -> Result<Json<client::Model>, JsonApiError> {
    Ok(Json(state.services.clients.set_repair_status(id, body.status).await?))
}

#[utoipa::path(patch, path = "/api/clients/{id}/payment-status", tag = "clients", params(("id" = Uuid, Path, description = "Client id")), responses((status = 200, description = "Updated")))]
pub async fn set_payment_status(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<StatusUpdate<PaymentStatus>>,
) -> Result<Json<client::Model>, JsonApiError> {
    Ok(Json(state.services.clients.set_payment_status(id, body.status).await?))
}

#[utoipa::path(get, path = "/api/clients/{id}/history", tag = "clients", params(("id" = Uuid, Path, description = "Client id")), responses((status = 200, description = "Invoices, budgets, appointments and payments")))]
pub async fn history(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<Json<ClientHistory>, JsonApiError> {
    Ok(Json(state.services.clients.history(id).await?))
}
