//! Bearer authentication and role guards.

use axum::async_trait;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::{header, request::Parts, Method};
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;

use models::enums::Role;
use service::auth::{AuthError, Claims};
use service::Services;

use crate::errors::JsonApiError;

#[derive(Clone)]
pub struct ServerState {
    pub services: Services,
}

pub const ADMIN: &[Role] = &[Role::Admin];
pub const MANAGEMENT: &[Role] = &[Role::Admin, Role::Manager];

fn is_public(path: &str, method: &Method) -> bool {
    method == Method::OPTIONS
        || path == "/health"
        || path == "/auth/login"
        || path.starts_with("/docs")
        || path.starts_with("/api-docs")
}

/// Global middleware: everything except health, login, docs and preflight
/// needs `Authorization: Bearer <token>` of an existing, active user. Claims
/// refreshed from the account are stored in the request extensions for
/// [`CurrentUser`].
pub async fn require_bearer_token(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, JsonApiError> {
    if is_public(req.uri().path(), req.method()) {
        return Ok(next.run(req).await);
    }

    let token = match req.headers().get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(h) => match h.strip_prefix("Bearer ").map(str::trim) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => {
                warn!(path = %req.uri().path(), "invalid Authorization format (expect Bearer)");
                return Err(JsonApiError::unauthorized("expected Authorization: Bearer <token>"));
            }
        },
        None => {
            warn!(path = %req.uri().path(), "missing Authorization header");
            return Err(AuthError::MissingToken.into());
        }
    };

    let claims = state.services.auth.authenticate(&token).await.map_err(|e| {
        warn!(path = %req.uri().path(), err = %e, "token rejected");
        JsonApiError::from(e)
    })?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Claims of the authenticated caller.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Claims);

impl CurrentUser {
    /// 403 unless the caller holds one of `roles` (admins always pass).
    pub fn require(&self, roles: &[Role]) -> Result<(), JsonApiError> {
        if self.0.has_any_role(roles) {
            Ok(())
        } else {
            warn!(user = %self.0.sub, role = %self.0.role, "role check failed");
            Err(JsonApiError::forbidden(format!("role {} is not allowed here", self.0.role)))
        }
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = JsonApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| AuthError::MissingToken.into())
    }
}
