use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use common::types::Page;
use models::expense;
use service::expenses::{ExpenseInput, ExpenseUpdate};
use service::pagination::Pagination;
use service::repository::ExpenseFilter;

use crate::auth::{CurrentUser, ServerState, MANAGEMENT};
use crate::errors::JsonApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/expenses", get(list).post(create))
        .route("/api/expenses/:id", get(get_one).patch(update).delete(remove))
}

#[utoipa::path(get, path = "/api/expenses", tag = "expenses", responses((status = 200, description = "Page of expenses, newest first")))]
pub async fn list(
    State(state): State<ServerState>,
    ApiQuery(filter): ApiQuery<ExpenseFilter>,
    ApiQuery(page): ApiQuery<Pagination>,
) -> Result<Json<Page<expense::Model>>, JsonApiError> {
    Ok(Json(state.services.expenses.list(filter, page).await?))
}

#[utoipa::path(get, path = "/api/expenses/{id}", tag = "expenses", params(("id" = Uuid, Path, description = "Expense id")), responses((status = 200, description = "Expense"), (status = 404, description = "Not found")))]
pub async fn get_one(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<Json<expense::Model>, JsonApiError> {
    Ok(Json(state.services.expenses.get(id).await?))
}

#[utoipa::path(post, path = "/api/expenses", tag = "expenses", responses((status = 201, description = "Created"), (status = 400, description = "Amount must be positive")))]
pub async fn create(State(state): State<ServerState>, ApiJson(input): ApiJson<ExpenseInput>) -> Result<(StatusCode, Json<expense::Model>), JsonApiError> {
    Ok((StatusCode::CREATED, Json(state.services.expenses.create(input).await?)))
}

#[utoipa::path(patch, path = "/api/expenses/{id}", tag = "expenses", params(("id" = Uuid, Path, description = "Expense id")), responses((status = 200, description = "Updated")))]
pub async fn update(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(upd): ApiJson<ExpenseUpdate>,
) -> Result<Json<expense::Model>, JsonApiError> {
    Ok(Json(state.services.expenses.update(id, upd).await?))
}

#[utoipa::path(delete, path = "/api/expenses/{id}", tag = "expenses", params(("id" = Uuid, Path, description = "Expense id")), responses((status = 204, description = "Deleted"), (status = 403, description = "Admin or manager only")))]
pub async fn remove(State(state): State<ServerState>, user: CurrentUser, ApiPath(id): ApiPath<Uuid>) -> Result<StatusCode, JsonApiError> {
    user.require(MANAGEMENT)?;
    state.services.expenses.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
