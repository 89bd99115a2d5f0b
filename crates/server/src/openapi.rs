use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};

#[derive(ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// `role` is one of admin, manager, mechanic, receptionist.
#[derive(ToSchema)]
pub struct CreateUserRequest {
    pub email: String,
    pub name: String,
    pub role: String,
    pub password: String,
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::login,
        crate::routes::auth::me,
        crate::routes::users::list,
        crate::routes::users::get_one,
        crate::routes::users::create,
        crate::routes::users::update,
        crate::routes::users::reset_password,
        crate::routes::users::remove,
        crate::routes::clients::list,
        crate::routes::clients::get_one,
        crate::routes::clients::create,
        crate::routes::clients::update,
        crate::routes::clients::remove,
        crate::routes::clients::set_repair_status,
        crate::routes::clients::set_payment_status,
        crate::routes::clients::history,
        crate::routes::invoices::list,
        crate::routes::invoices::get_one,
        crate::routes::invoices::create,
        crate::routes::invoices::update,
        crate::routes::invoices::remove,
        crate::routes::invoices::issue,
        crate::routes::invoices::cancel,
        crate::routes::invoices::payments,
        crate::routes::invoices::record_payment,
        crate::routes::invoices::mark_overdue,
        crate::routes::invoices::pdf,
        crate::routes::payments::list,
        crate::routes::budgets::list,
        crate::routes::budgets::get_one,
        crate::routes::budgets::create,
        crate::routes::budgets::update,
        crate::routes::budgets::remove,
        crate::routes::budgets::approve,
        crate::routes::budgets::reject,
        crate::routes::budgets::convert,
        crate::routes::appointments::list,
        crate::routes::appointments::get_one,
        crate::routes::appointments::create,
        crate::routes::appointments::update,
        crate::routes::appointments::set_status,
        crate::routes::appointments::remove,
        crate::routes::expenses::list,
        crate::routes::expenses::get_one,
        crate::routes::expenses::create,
        crate::routes::expenses::update,
        crate::routes::expenses::remove,
        crate::routes::shipments::list,
        crate::routes::shipments::get_one,
        crate::routes::shipments::create,
        crate::routes::shipments::update,
        crate::routes::shipments::set_status,
        crate::routes::shipments::remove,
        crate::routes::reports::financial,
        crate::routes::reports::financial_pdf,
        crate::routes::reports::financial_xlsx,
        crate::routes::reports::dashboard,
    ),
    components(schemas(HealthResponse, LoginRequest, CreateUserRequest)),
    modifiers(&BearerAuth),
    security(("bearer" = [])),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "users"),
        (name = "clients"),
        (name = "invoices"),
        (name = "payments"),
        (name = "budgets"),
        (name = "appointments"),
        (name = "expenses"),
        (name = "shipments"),
        (name = "reports")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_core_paths() {
        let doc = ApiDoc::openapi();
        for p in ["/auth/login", "/api/clients/{id}/repair-status", "/api/invoices/{id}/payments", "/api/reports/financial/xlsx"] {
            assert!(doc.paths.paths.contains_key(p), "missing {p}");
        }
    }
}
