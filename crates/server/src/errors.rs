use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

use models::errors::ModelError;
use service::auth::AuthError;
use service::errors::ServiceError;

/// Error body of every JSON endpoint: `{"error": <kind>, "message": <text>}`.
#[derive(Debug)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub kind: &'static str,
    pub message: String,
}

impl JsonApiError {
    pub fn new(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        Self { status, kind, message: message.into() }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "validation_error", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "forbidden", message)
    }
}

impl From<ServiceError> for JsonApiError {
    fn from(e: ServiceError) -> Self {
        let message = e.to_string();
        match e {
            ServiceError::Validation(_) | ServiceError::Model(ModelError::Validation(_)) => {
                Self::new(StatusCode::BAD_REQUEST, "validation_error", message)
            }
            ServiceError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, "not_found", message),
            ServiceError::Conflict(_) => Self::new(StatusCode::CONFLICT, "conflict", message),
            ServiceError::InvalidState(_) => Self::new(StatusCode::CONFLICT, "invalid_state", message),
            ServiceError::Unauthorized(_) => Self::unauthorized(message),
            ServiceError::Forbidden(_) => Self::forbidden(message),
            ServiceError::Db(_) | ServiceError::Model(_) | ServiceError::Export(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        }
    }
}

impl From<AuthError> for JsonApiError {
    fn from(e: AuthError) -> Self {
        let message = e.to_string();
        match e {
            AuthError::Validation(_) => Self::new(StatusCode::BAD_REQUEST, "validation_error", message),
            AuthError::Conflict => Self::new(StatusCode::CONFLICT, "conflict", message),
            AuthError::MissingToken | AuthError::Unauthorized | AuthError::Inactive | AuthError::TokenError(_) => {
                Self::unauthorized(message)
            }
            AuthError::HashError(_) | AuthError::Repository(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        }
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, error = %self.message, "request failed");
        }
        let body = serde_json::json!({"error": self.kind, "message": self.message});
        (self.status, Json(body)).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("migration failed: {0}")]
    Migration(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_errors_map_to_http_status() {
        let cases = [
            (ServiceError::validation("x"), StatusCode::BAD_REQUEST),
            (ServiceError::not_found("client"), StatusCode::NOT_FOUND),
            (ServiceError::Conflict("dup".into()), StatusCode::CONFLICT),
            (ServiceError::invalid_state("paid"), StatusCode::CONFLICT),
            (ServiceError::Unauthorized("user inactive".into()), StatusCode::UNAUTHORIZED),
            (ServiceError::Forbidden("no".into()), StatusCode::FORBIDDEN),
            (ServiceError::Db("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (ServiceError::Model(ModelError::validation("bad phone")), StatusCode::BAD_REQUEST),
        ];
        for (err, status) in cases {
            assert_eq!(JsonApiError::from(err).status, status);
        }
    }

    #[test]
    fn auth_failures_are_401() {
        assert_eq!(JsonApiError::from(AuthError::Inactive).status, StatusCode::UNAUTHORIZED);
        assert_eq!(JsonApiError::from(AuthError::TokenError("expired".into())).status, StatusCode::UNAUTHORIZED);
        assert_eq!(JsonApiError::from(AuthError::Conflict).status, StatusCode::CONFLICT);
    }
}
