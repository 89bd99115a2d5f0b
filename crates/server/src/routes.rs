pub mod appointments;
pub mod auth;
pub mod budgets;
pub mod clients;
pub mod expenses;
pub mod invoices;
pub mod payments;
pub mod reports;
pub mod shipments;
pub mod users;

use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::{middleware, routing::get, Json, Router};
use serde::Deserialize;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;

use crate::auth::{require_bearer_token, ServerState};
use crate::openapi::ApiDoc;

/// Body of the `.../status` endpoints.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate<T> {
    pub status: T,
}

/// Binary download with `Content-Disposition: attachment`.
pub(crate) fn attachment(content_type: &'static str, filename: String, bytes: Vec<u8>) -> Response {
    let disposition = format!("attachment; filename=\"{filename}\"");
    (
        [(header::CONTENT_TYPE, content_type.to_string()), (header::CONTENT_DISPOSITION, disposition)],
        bytes,
    )
        .into_response()
}

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok", version: env!("CARGO_PKG_VERSION") })
}

/// Build the full application router: public routes, the bearer-protected
/// API and the Swagger UI.
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let api = Router::new()
        .merge(auth::router())
        .merge(users::router())
        .merge(clients::router())
        .merge(invoices::router())
        .merge(payments::router())
        .merge(budgets::router())
        .merge(appointments::router())
        .merge(expenses::router())
        .merge(shipments::router())
        .merge(reports::router());

    Router::new()
        .route("/health", get(health))
        .merge(api)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn_with_state(state.clone(), require_bearer_token))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
