use axum::{
    extract::State,
    response::Response,
    routing::get,
    Json, Router,
};
use chrono::Utc;

use service::reports::{Dashboard, FinancialReport, ReportParams};

use super::attachment;
use crate::auth::{CurrentUser, ServerState, MANAGEMENT};
use crate::errors::JsonApiError;
use crate::extract::ApiQuery;

const XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/reports/financial", get(financial))
        .route("/api/reports/financial/pdf", get(financial_pdf))
        .route("/api/reports/financial/xlsx", get(financial_xlsx))
        .route("/api/reports/dashboard", get(dashboard))
}

#[utoipa::path(get, path = "/api/reports/financial", tag = "reports", responses((status = 200, description = "Financial report"), (status = 400, description = "from after to"), (status = 403, description = "Admin or manager only")))]
pub async fn financial(
    State(state): State<ServerState>,
    user: CurrentUser,
    ApiQuery(params): ApiQuery<ReportParams>,
) -> Result<Json<FinancialReport>, JsonApiError> {
    user.require(MANAGEMENT)?;
    Ok(Json(state.services.reports.financial(params, Utc::now().date_naive()).await?))
}

#[utoipa::path(get, path = "/api/reports/financial/pdf", tag = "reports", responses((status = 200, description = "Report as PDF attachment")))]
pub async fn financial_pdf(
    State(state): State<ServerState>,
    user: CurrentUser,
    ApiQuery(params): ApiQuery<ReportParams>,
) -> Result<Response, JsonApiError> {
    user.require(MANAGEMENT)?;
    let (filename, bytes) = state.services.reports.financial_pdf(params, Utc::now().date_naive()).await?;
    Ok(attachment("application/pdf", filename, bytes))
}

#[utoipa::path(get, path = "/api/reports/financial/xlsx", tag = "reports", responses((status = 200, description = "Report as XLSX attachment")))]
pub async fn financial_xlsx(
    State(state): State<ServerState>,
    user: CurrentUser,
    ApiQuery(params): ApiQuery<ReportParams>,
) -> Result<Response, JsonApiError> {
    user.require(MANAGEMENT)?;
    let (filename, bytes) = state.services.reports.financial_xlsx(params, Utc::now().date_naive()).await?;
    Ok(attachment(XLSX, filename, bytes))
}

#[utoipa::path(get, path = "/api/reports/dashboard", tag = "reports", responses((status = 200, description = "Counters for the landing page")))]
pub async fn dashboard(State(state): State<ServerState>) -> Result<Json<Dashboard>, JsonApiError> {
    Ok(Json(state.services.reports.dashboard(Utc::now().date_naive()).await?))
}
