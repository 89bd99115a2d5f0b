use axum::{extract::State, routing::{get, post}, Json, Router};

use models::user;
use service::auth::{AuthSession, LoginInput};

use crate::auth::{CurrentUser, ServerState};
use crate::errors::JsonApiError;
use crate::extract::ApiJson;

pub fn router() -> Router<ServerState> {
    Router::new().route("/auth/login", post(login)).route("/auth/me", get(me))
}

#[utoipa::path(post, path = "/auth/login", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Token and profile"), (status = 401, description = "Unauthorized")))]
pub async fn login(State(state): State<ServerState>, ApiJson(input): ApiJson<LoginInput>) -> Result<Json<AuthSession>, JsonApiError> {
    Ok(Json(state.services.auth.login(input).await?))
}

#[utoipa::path(get, path = "/auth/me", tag = "auth", responses((status = 200, description = "Caller profile"), (status = 401, description = "Unauthorized")))]
pub async fn me(State(state): State<ServerState>, CurrentUser(claims): CurrentUser) -> Result<Json<user::Model>, JsonApiError> {
    Ok(Json(state.services.auth.profile(&claims).await?))
}
