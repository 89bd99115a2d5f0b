use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use common::types::Page;
use models::user;
use service::pagination::Pagination;
use service::repository::UserFilter;
use service::users::{CreateUser, UpdateUser};

use crate::auth::{CurrentUser, ServerState, ADMIN};
use crate::errors::JsonApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};

#[derive(Debug, Deserialize)]
pub struct PasswordReset {
    pub password: String,
}

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/users", get(list).post(create))
        .route("/api/users/:id", get(get_one).patch(update).delete(remove))
        .route("/api/users/:id/password", post(reset_password))
}

#[utoipa::path(get, path = "/api/users", tag = "users", responses((status = 200, description = "Page of users"), (status = 403, description = "Admin only")))]
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
    ApiQuery(filter): ApiQuery<UserFilter>,
    ApiQuery(page): ApiQuery<Pagination>,
) -> Result<Json<Page<user::Model>>, JsonApiError> {
    user.require(ADMIN)?;
    Ok(Json(state.services.users.list(filter, page).await?))
}

#[utoipa::path(get, path = "/api/users/{id}", tag = "users", params(("id" = Uuid, Path, description = "User id")), responses((status = 200, description = "User"), (status = 404, description = "Not found")))]
pub async fn get_one(State(state): State<ServerState>, user: CurrentUser, ApiPath(id): ApiPath<Uuid>) -> Result<Json<user::Model>, JsonApiError> {
    user.require(ADMIN)?;
    Ok(Json(state.services.users.get(id).await?))
}

#[utoipa::path(post, path = "/api/users", tag = "users", request_body = crate::openapi::CreateUserRequest, responses((status = 201, description = "Created"), (status = 409, description = "Duplicate email")))]
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    ApiJson(input): ApiJson<CreateUser>,
) -> Result<(StatusCode, Json<user::Model>), JsonApiError> {
    user.require(ADMIN)?;
    Ok((StatusCode::CREATED, Json(state.services.users.create(input).await?)))
}

#[utoipa::path(patch, path = "/api/users/{id}", tag = "users", params(("id" = Uuid, Path, description = "User id")), responses((status = 200, description = "Updated"), (status = 409, description = "Self demotion or deactivation")))]
pub async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<UpdateUser>,
) -> Result<Json<user::Model>, JsonApiError> {
    user.require(ADMIN)?;
    Ok(Json(state.services.users.update(user.0.uid, id, input).await?))
}

#[utoipa::path(post, path = "/api/users/{id}/password", tag = "users", params(("id" = Uuid, Path, description = "User id")), responses((status = 204, description = "Password replaced")))]
pub async fn reset_password(
    State(state): State<ServerState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<PasswordReset>,
) -> Result<StatusCode, JsonApiError> {
    user.require(ADMIN)?;
    state.services.users.reset_password(id, &input.password).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(delete, path = "/api/users/{id}", tag = "users", params(("id" = Uuid, Path, description = "User id")), responses((status = 204, description = "Deleted")))]
pub async fn remove(State(state): State<ServerState>, user: CurrentUser, ApiPath(id): ApiPath<Uuid>) -> Result<StatusCode, JsonApiError> {
    user.require(ADMIN)?;
    state.services.users.delete(user.0.uid, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
