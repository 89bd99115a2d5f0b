use axum::{
    extract::State,
    routing::get,
    Json, Router,
};

use common::types::Page;
use models::payment;
use service::pagination::Pagination;
use service::repository::PaymentFilter;

use crate::auth::ServerState;
use crate::errors::JsonApiError;
use crate::extract::ApiQuery;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/payments", get(list))
}

#[utoipa::path(get, path = "/api/payments", tag = "payments", responses((status = 200, description = "Payment history, newest first"), (status = 400, description = "from after to")))]
pub async fn list(
    State(state): State<ServerState>,
    ApiQuery(filter): ApiQuery<PaymentFilter>,
    ApiQuery(page): ApiQuery<Pagination>,
) -> Result<Json<Page<payment::Model>>, JsonApiError> {
    Ok(Json(state.services.payments.list(filter, page).await?))
}
