use std::str::FromStr;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tower::ServiceExt;
use tower_http::cors::CorsLayer;

use configs::{AuthConfig, BusinessConfig};
use models::enums::Role;
use server::routes::build_router;
use server::ServerState;
use service::repository::Repositories;
use service::Services;

const ADMIN: (&str, &str) = ("admin@garage.test", "admin-pass-1");
const MECHANIC: (&str, &str) = ("mech@garage.test", "mech-pass-1");

async fn build_app() -> anyhow::Result<Router> {
    let auth = AuthConfig { jwt_secret: "test-secret".into(), ..Default::default() };
    let services = Services::new(Repositories::memory(), auth, BusinessConfig::default());
    services.auth.create_account(ADMIN.0, "Admin", Role::Admin, ADMIN.1).await?;
    services.auth.create_account(MECHANIC.0, "Pau Mechanic", Role::Mechanic, MECHANIC.1).await?;
    Ok(build_router(ServerState { services }, CorsLayer::very_permissive()))
}

async fn raw(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> anyhow::Result<Response> {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    let req = match body {
        Some(b) => req.header(header::CONTENT_TYPE, "application/json").body(Body::from(serde_json::to_vec(&b)?))?,
        None => req.body(Body::empty())?,
    };
    Ok(app.clone().oneshot(req).await?)
}

async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> anyhow::Result<(StatusCode, Value)> {
    let resp = raw(app, method, uri, token, body).await?;
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await?;
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    Ok((status, json))
}

async fn login(app: &Router, (email, password): (&str, &str)) -> anyhow::Result<String> {
    let (status, body) = send(app, Method::POST, "/auth/login", None, Some(json!({"email": email, "password": password}))).await?;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    Ok(body["token"].as_str().unwrap_or_default().to_string())
}

fn money(v: &Value) -> Decimal {
    match v {
        Value::String(s) => Decimal::from_str(s).unwrap(),
        other => Decimal::from_str(&other.to_string()).unwrap(),
    }
}

fn client_body(plate: &str) -> Value {
    json!({
        "name": "Lucia Ortega",
        "phone": "600 123 456",
        "vehicle_make": "Seat",
        "vehicle_model": "Ibiza",
        "license_plate": plate,
    })
}

#[tokio::test]
async fn health_and_docs_are_public_everything_else_needs_a_token() -> anyhow::Result<()> {
    let app = build_app().await?;
    let (status, body) = send(&app, Method::GET, "/health", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, _) = send(&app, Method::GET, "/api-docs/openapi.json", None, None).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::GET, "/api/clients", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = send(&app, Method::GET, "/api/clients", Some("not-a-jwt"), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn login_then_me() -> anyhow::Result<()> {
    let app = build_app().await?;
    let (status, _) = send(&app, Method::POST, "/auth/login", None, Some(json!({"email": ADMIN.0, "password": "wrong-pass"}))).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = login(&app, ADMIN).await?;
    let (status, me) = send(&app, Method::GET, "/auth/me", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], ADMIN.0);
    assert_eq!(me["role"], "admin");
    Ok(())
}

#[tokio::test]
async fn roles_guard_reports_and_users() -> anyhow::Result<()> {
    let app = build_app().await?;
    let mech = login(&app, MECHANIC).await?;
    let admin = login(&app, ADMIN).await?;
    let uri = "/api/reports/financial?from=2024-01-01&to=2024-01-31";

    let (status, body) = send(&app, Method::GET, uri, Some(&mech), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
    let (status, _) = send(&app, Method::GET, "/api/users", Some(&mech), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&app, Method::GET, "/api/reports/dashboard", Some(&mech), None).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, report) = send(&app, Method::GET, uri, Some(&admin), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["monthly"].as_array().map(Vec::len), Some(1));
    Ok(())
}

#[tokio::test]
async fn user_admin_rules() -> anyhow::Result<()> {
    let app = build_app().await?;
    let admin = login(&app, ADMIN).await?;
    let new_user = json!({"email": "Desk@Garage.test", "name": "Front Desk", "role": "receptionist", "password": "desk-pass-1"});

    let (status, created) = send(&app, Method::POST, "/api/users", Some(&admin), Some(new_user.clone())).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["email"], "desk@garage.test");
    let (status, _) = send(&app, Method::POST, "/api/users", Some(&admin), Some(new_user)).await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, me) = send(&app, Method::GET, "/auth/me", Some(&admin), None).await?;
    let me_uri = format!("/api/users/{}", me["id"].as_str().unwrap_or_default());
    let (status, _) = send(&app, Method::DELETE, &me_uri, Some(&admin), None).await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let desk = login(&app, ("desk@garage.test", "desk-pass-1")).await?;
    let (status, _) = send(&app, Method::GET, "/api/clients", Some(&desk), None).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn tokens_follow_account_state() -> anyhow::Result<()> {
    let app = build_app().await?;
    let admin = login(&app, ADMIN).await?;
    let manager = json!({"email": "boss@garage.test", "name": "Marta", "role": "manager", "password": "boss-pass-1"});
    let (status, created) = send(&app, Method::POST, "/api/users", Some(&admin), Some(manager)).await?;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!("/api/users/{}", created["id"].as_str().unwrap_or_default());
    let token = login(&app, ("boss@garage.test", "boss-pass-1")).await?;
    let report = "/api/reports/financial?from=2024-01-01&to=2024-01-31";

    let (status, _) = send(&app, Method::GET, report, Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::PATCH, &uri, Some(&admin), Some(json!({"role": "mechanic"}))).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::GET, report, Some(&token), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, Method::PATCH, &uri, Some(&admin), Some(json!({"active": false}))).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&app, Method::POST, "/api/clients", Some(&token), Some(client_body("5555KLM"))).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
    let (status, _) = send(&app, Method::GET, "/auth/me", Some(&token), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::DELETE, &uri, Some(&admin), None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::GET, "/api/clients", Some(&token), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn malformed_input_gets_json_validation_errors() -> anyhow::Result<()> {
    let app = build_app().await?;
    let token = login(&app, ADMIN).await?;

    let (status, body) = send(&app, Method::POST, "/api/clients", Some(&token), Some(json!({"phone": "600123456"}))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert!(body["message"].as_str().unwrap_or_default().contains("name"));

    let (status, body) = send(&app, Method::GET, "/api/reports/financial?from=notadate&to=2024-01-31", Some(&token), None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = send(&app, Method::GET, "/api/clients?page=abc", Some(&token), None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = send(&app, Method::GET, "/api/clients/not-a-uuid", Some(&token), None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    Ok(())
}

#[tokio::test]
async fn client_lifecycle()-> anyhow::Result<()> {
    let app = build_app().await?;
    let admin = login(&app, ADMIN).await?;
    let mech = login(&app, MECHANIC).await?;

    let (status, client) = send(&app, Method::POST, "/api/clients", Some(&mech), Some(client_body("1234-bcd"))).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(client["license_plate"], "1234BCD");
    assert_eq!(client["repair_status"], "waiting");
    let id = client["id"].as_str().unwrap_or_default().to_string();

    let (status, body) = send(&app, Method::POST, "/api/clients", Some(&mech), Some(client_body("1234 BCD"))).await?;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    let repair = format!("/api/clients/{id}/repair-status");
    let (status, _) = send(&app, Method::PATCH, &repair, Some(&mech), Some(json!({"status": "delivered"}))).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, moved) = send(&app, Method::PATCH, &repair, Some(&mech), Some(json!({"status": "in_progress"}))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["repair_status"], "in_progress");

    let (status, page) = send(&app, Method::GET, "/api/clients?repair_status=in_progress&per_page=5", Some(&mech), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    assert_eq!(page["per_page"], 5);

    let (status, history) = send(&app, Method::GET, &format!("/api/clients/{id}/history"), Some(&mech), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history["invoices"], json!([]));

    let one = format!("/api/clients/{id}");
    let (status, _) = send(&app, Method::DELETE, &one, Some(&mech), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&app, Method::DELETE, &one, Some(&admin), None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = send(&app, Method::GET, &one, Some(&admin), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
    Ok(())
}

#[tokio::test]
async fn invoice_payments_drive_statuses() -> anyhow::Result<()> {
    let app = build_app().await?;
    let token = login(&app, ADMIN).await?;
    let (_, client) = send(&app, Method::POST, "/api/clients", Some(&token), Some(client_body("8080XYZ"))).await?;
    let client_id = client["id"].as_str().unwrap_or_default().to_string();

    let invoice = json!({
        "client_id": client_id,
        "items": [
            {"description": "labour", "kind": "service", "quantity": "2", "unit_price": "45.00"},
            {"description": "brake discs", "kind": "part", "quantity": "1", "unit_price": "110.00"}
        ],
        "discount": "20",
        "issue": true
    });
    let (status, inv) = send(&app, Method::POST, "/api/invoices", Some(&token), Some(invoice)).await?;
    assert_eq!(status, StatusCode::CREATED, "{inv}");
    assert_eq!(inv["status"], "issued");
    assert!(inv["number"].as_str().unwrap_or_default().starts_with("INV-"));
    assert_eq!(money(&inv["total"]), Decimal::from_str("217.80")?);
    let pay = format!("/api/invoices/{}/payments", inv["id"].as_str().unwrap_or_default());

    let (status, body) = send(&app, Method::POST, &pay, Some(&token), Some(json!({"amount": "300", "method": "cash"}))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, first) = send(&app, Method::POST, &pay, Some(&token), Some(json!({"amount": "100", "method": "cash"}))).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["invoice"]["status"], "partially_paid");

    let (status, second) = send(&app, Method::POST, &pay, Some(&token), Some(json!({"amount": "117.80", "method": "card"}))).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(second["invoice"]["status"], "paid");

    let (_, client) = send(&app, Method::GET, &format!("/api/clients/{client_id}"), Some(&token), None).await?;
    assert_eq!(client["payment_status"], "paid");
    let (_, listed) = send(&app, Method::GET, &format!("/api/payments?client_id={client_id}"), Some(&token), None).await?;
    assert_eq!(listed["total"], 2);

    let resp = raw(&app, Method::GET, &format!("/api/invoices/{}/pdf", inv["id"].as_str().unwrap_or_default()), Some(&token), None).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/pdf");
    let disposition = resp.headers()[header::CONTENT_DISPOSITION].to_str()?.to_string();
    assert!(disposition.starts_with("attachment;"));
    let bytes = to_bytes(resp.into_body(), usize::MAX).await?;
    assert!(bytes.starts_with(b"%PDF"));
    Ok(())
}

#[tokio::test]
async fn financial_report_rejects_inverted_window_and_exports_xlsx() -> anyhow::Result<()> {
    let app = build_app().await?;
    let token = login(&app, ADMIN).await?;

    let (status, body) = send(&app, Method::GET, "/api/reports/financial?from=2024-02-01&to=2024-01-01", Some(&token), None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let resp = raw(&app, Method::GET, "/api/reports/financial/xlsx?from=2024-01-01&to=2024-12-31", Some(&token), None).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers()[header::CONTENT_TYPE].to_str()?.contains("spreadsheetml"));
    assert!(resp.headers()[header::CONTENT_DISPOSITION].to_str()?.starts_with("attachment;"));
    let bytes = to_bytes(resp.into_body(), usize::MAX).await?;
    assert!(bytes.starts_with(b"PK"));
    Ok(())
}

#[tokio::test]
async fn shipment_status_rules() -> anyhow::Result<()> {
    let app = build_app().await?;
    let token = login(&app, MECHANIC).await?;
    let req = json!({
        "requester_name": "Dr. Irene Soler",
        "requester_email": "irene@lab.test",
        "institution": "Hospital Clinic",
        "destination_name": "Central Biobank",
        "destination_address": "Calle Mayor 1, Madrid",
        "sample_type": "serum",
        "sample_count": 3,
        "temperature": "frozen",
        "requested_ship_date": "2024-10-01"
    });
    let (status, created) = send(&app, Method::POST, "/api/shipments", Some(&token), Some(req)).await?;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["status"], "draft");
    let status_uri = format!("/api/shipments/{}/status", created["id"].as_str().unwrap_or_default());

    let (status, _) = send(&app, Method::PATCH, &status_uri, Some(&token), Some(json!({"status": "shipped"}))).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    for next in ["submitted", "approved"] {
        let (status, _) = send(&app, Method::PATCH, &status_uri, Some(&token), Some(json!({"status": next}))).await?;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, _) = send(&app, Method::PATCH, &status_uri, Some(&token), Some(json!({"status": "shipped"}))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, shipped) = send(
        &app,
        Method::PATCH,
        &status_uri,
        Some(&token),
        Some(json!({"status": "shipped", "carrier": "DHL", "tracking_number": "JD0146"})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert!(!shipped["shipped_at"].is_null());
    Ok(())
}
