use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use uuid::Uuid;

use common::types::Page;
use models::shipment_request;
use service::pagination::Pagination;
use service::repository::ShipmentFilter;
use service::shipments::{ShipmentInput, ShipmentPatch, ShipmentStatusChange};

use crate::auth::ServerState;
use crate::errors::JsonApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/shipments", get(list).post(create))
        .route("/api/shipments/:id", get(get_one).patch(update).delete(remove))
        .route("/api/shipments/:id/status", patch(set_status))
}

#[utoipa::path(get, path = "/api/shipments", tag = "shipments", responses((status = 200, description = "Page of shipment requests")))]
pub async fn list(
    State(state): State<ServerState>,
    ApiQuery(filter): ApiQuery<ShipmentFilter>,
    ApiQuery(page): ApiQuery<Pagination>,
) -> Result<Json<Page<shipment_request::Model>>, JsonApiError> {
    Ok(Json(state.services.shipments.list(filter, page).await?))
}

#[utoipa::path(get, path = "/api/shipments/{id}", tag = "shipments", params(("id" = Uuid, Path, description = "Shipment request id")), responses((status = 200, description = "Shipment request"), (status = 404, description = "Not found")))]
pub async fn get_one(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<Json<shipment_request::Model>, JsonApiError> {
    Ok(Json(state.services.shipments.get(id).await?))
}

#[utoipa::path(post, path = "/api/shipments", tag = "shipments", responses((status = 201, description = "Draft created"), (status = 400, description = "Invalid contents")))]
pub async fn create(
    State(state): State<ServerState>,
    ApiJson(input): ApiJson<ShipmentInput>,
) -> Result<(StatusCode, Json<shipment_request::Model>), JsonApiError> {
    Ok((StatusCode::CREATED, Json(state.services.shipments.create(input).await?)))
}

#[utoipa::path(patch, path = "/api/shipments/{id}", tag = "shipments", params(("id" = Uuid, Path, description = "Shipment request id")), responses((status = 200, description = "Updated"), (status = 409, description = "No longer editable")))]
pub async fn update(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<ShipmentPatch>,
) -> Result<Json<shipment_request::Model>, JsonApiError> {
    Ok(Json(state.services.shipments.update(id, patch).await?))
}

#[utoipa::path(patch, path = "/api/shipments/{id}/status", tag = "shipments", params(("id" = Uuid, Path, description = "Shipment request id")), responses((status = 200, description = "Moved"), (status = 400, description = "Carrier and tracking required"), (status = 409, description = "Transition not allowed")))]
pub async fn set_status(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(change): ApiJson<ShipmentStatusChange>,
) -> Result<Json<shipment_request::Model>, JsonApiError> {
    Ok(Json(state.services.shipments.set_status(id, change).await?))
}

#[utoipa::path(delete, path = "/api/shipments/{id}", tag = "shipments", params(("id" = Uuid, Path, description = "Shipment request id")), responses((status = 204, description = "Deleted"), (status = 409, description = "Only drafts")))]
pub async fn remove(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<StatusCode, JsonApiError> {
    state.services.shipments.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
