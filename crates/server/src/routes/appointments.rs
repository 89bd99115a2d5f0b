use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use uuid::Uuid;

use common::types::Page;
use models::appointment;
use models::enums::AppointmentStatus;
use service::appointments::{AppointmentInput, AppointmentUpdate};
use service::pagination::Pagination;
use service::repository::AppointmentFilter;

use super::StatusUpdate;
use crate::auth::ServerState;
use crate::errors::JsonApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/appointments", get(list).post(create))
        .route("/api/appointments/:id", get(get_one).patch(update).delete(remove))
        .route("/api/appointments/:id/status", patch(set_status))
}

#[utoipa::path(get, path = "/api/appointments", tag = "appointments", responses((status = 200, description = "Page of appointments, earliest first")))]
pub async fn list(
    State(state): State<ServerState>,
    ApiQuery(filter): ApiQuery<AppointmentFilter>,
    ApiQuery(page): ApiQuery<Pagination>,
) -> Result<Json<Page<appointment::Model>>, JsonApiError> {
    Ok(Json(state.services.appointments.list(filter, page).await?))
}

#[utoipa::path(get, path = "/api/appointments/{id}", tag = "appointments", params(("id" = Uuid, Path, description = "Appointment id")), responses((status = 200, description = "Appointment"), (status = 404, description = "Not found")))]
pub async fn get_one(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<Json<appointment::Model>, JsonApiError> {
    Ok(Json(state.services.appointments.get(id).await?))
}

#[utoipa::path(post, path = "/api/appointments", tag = "appointments", responses((status = 201, description = "Scheduled"), (status = 409, description = "Mechanic already booked")))]
pub async fn create(
    State(state): State<ServerState>,
    ApiJson(input): ApiJson<AppointmentInput>,
) -> Result<(StatusCode, Json<appointment::Model>), JsonApiError> {
    Ok((StatusCode::CREATED, Json(state.services.appointments.create(input).await?)))
}

#[utoipa::path(patch, path = "/api/appointments/{id}", tag = "appointments", params(("id" = Uuid, Path, description = "Appointment id")), responses((status = 200, description = "Updated"), (status = 409, description = "Overlap or terminal")))]
pub async fn update(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(upd): ApiJson<AppointmentUpdate>,
) -> Result<Json<appointment::Model>, JsonApiError> {
    Ok(Json(state.services.appointments.update(id, upd).await?))
}

#[utoipa::path(patch, path = "/api/appointments/{id}/status", tag = "appointments", params(("id" = Uuid, Path, description = "Appointment id")), responses((status = 200, description = "Moved"), (status = 409, description = "Already terminal")))]
pub async fn set_status(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<StatusUpdate<AppointmentStatus>>,
) -> Result<Json<appointment::Model>, JsonApiError> {
    Ok(Json(state.services.appointments.set_status(id, body.status).await?))
}

#[utoipa::path(delete, path = "/api/appointments/{id}", tag = "appointments", params(("id" = Uuid, Path, description = "Appointment id")), responses((status = 204, description = "Deleted")))]
pub async fn remove(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<StatusCode, JsonApiError> {
    state.services.appointments.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
