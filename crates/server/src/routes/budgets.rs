use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use common::types::Page;
use models::{budget, invoice};
use service::budgets::{BudgetInput, BudgetUpdate};
use service::pagination::Pagination;
use service::repository::BudgetFilter;

use crate::auth::ServerState;
use crate::errors::JsonApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};

#[derive(Debug, Serialize)]
pub struct BudgetConverted {
    pub budget: budget::Model,
    pub invoice: invoice::Model,
}

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/budgets", get(list).post(create))
        .route("/api/budgets/:id", get(get_one).patch(update).delete(remove))
        .route("/api/budgets/:id/approve", post(approve))
        .route("/api/budgets/:id/reject", post(reject))
        .route("/api/budgets/:id/convert", post(convert))
}

#[utoipa::path(get, path = "/api/budgets", tag = "budgets", responses((status = 200, description = "Page of budgets; lapsed pending ones read as expired")))]
pub async fn list(
    State(state): State<ServerState>,
    ApiQuery(filter): ApiQuery<BudgetFilter>,
    ApiQuery(page): ApiQuery<Pagination>,
) -> Result<Json<Page<budget::Model>>, JsonApiError> {
    Ok(Json(state.services.budgets.list(filter, page).await?))
}

#[utoipa::path(get, path = "/api/budgets/{id}", tag = "budgets", params(("id" = Uuid, Path, description = "Budget id")), responses((status = 200, description = "Budget"), (status = 404, description = "Not found")))]
pub async fn get_one(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<Json<budget::Model>, JsonApiError> {
    Ok(Json(state.services.budgets.get(id).await?))
}

#[utoipa::path(post, path = "/api/budgets", tag = "budgets", responses((status = 201, description = "Created"), (status = 400, description = "Invalid input")))]
pub async fn create(State(state): State<ServerState>, ApiJson(input): ApiJson<BudgetInput>) -> Result<(StatusCode, Json<budget::Model>), JsonApiError> {
    Ok((StatusCode::CREATED, Json(state.services.budgets.create(input).await?)))
}

#[utoipa::path(patch, path = "/api/budgets/{id}", tag = "budgets", params(("id" = Uuid, Path, description = "Budget id")), responses((status = 200, description = "Updated"), (status = 409, description = "Not pending")))]
pub async fn update(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(upd): ApiJson<BudgetUpdate>,
) -> Result<Json<budget::Model>, JsonApiError> {
    Ok(Json(state.services.budgets.update(id, upd).await?))
}

#[utoipa::path(delete, path = "/api/budgets/{id}", tag = "budgets", params(("id" = Uuid, Path, description = "Budget id")), responses((status = 204, description = "Deleted"), (status = 409, description = "Already converted")))]
pub async fn remove(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<StatusCode, JsonApiError> {
    state.services.budgets.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(post, path = "/api/budgets/{id}/approve", tag = "budgets", params(("id" = Uuid, Path, description = "Budget id")), responses((status = 200, description = "Approved"), (status = 409, description = "Not pending or expired")))]
pub async fn approve(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<Json<budget::Model>, JsonApiError> {
    Ok(Json(state.services.budgets.approve(id).await?))
}

#[utoipa::path(post, path = "/api/budgets/{id}/reject", tag = "budgets", params(("id" = Uuid, Path, description = "Budget id")), responses((status = 200, description = "Rejected"), (status = 409, description = "Not pending or expired")))]
pub async fn reject(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<Json<budget::Model>, JsonApiError> {
    Ok(Json(state.services.budgets.reject(id).await?))
}

#[utoipa::path(post, path = "/api/budgets/{id}/convert", tag = "budgets", params(("id" = Uuid, Path, description = "Budget id")), responses((status = 201, description = "Issued invoice created"), (status = 409, description = "Not approved")))]
pub async fn convert(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<(StatusCode, Json<BudgetConverted>), JsonApiError> {
    let (budget, invoice) = state.services.budgets.convert(id).await?;
    Ok((StatusCode::CREATED, Json(BudgetConverted { budget, invoice })))
}
