use thiserror::Error;

use crate::errors::ServiceError;

/// Business errors for auth workflows
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("user already exists")]
    Conflict,
    #[error("missing bearer token")]
    MissingToken,
    #[error("invalid credentials")]
    Unauthorized,
    #[error("user inactive")]
    Inactive,
    #[error("hashing error: {0}")]
    HashError(String),
    #[error("token error: {0}")]
    TokenError(String),
    #[error("repository error: {0}")]
    Repository(String),
}

impl AuthError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            AuthError::Validation(_) => 1001,
            AuthError::Conflict => 1002,
            AuthError::MissingToken => 1003,
            AuthError::Unauthorized => 1004,
            AuthError::Inactive => 1005,
            AuthError::HashError(_) => 1101,
            AuthError::TokenError(_) => 1102,
            AuthError::Repository(_) => 1200,
        }
    }
}

impl From<ServiceError> for AuthError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(msg) => AuthError::Validation(msg),
            ServiceError::Model(models::errors::ModelError::Validation(msg)) => AuthError::Validation(msg),
            ServiceError::Conflict(_) => AuthError::Conflict,
            other => AuthError::Repository(other.to_string()),
        }
    }
}

impl From<AuthError> for ServiceError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Validation(msg) => ServiceError::Validation(msg),
            AuthError::Conflict => ServiceError::Conflict("user already exists".into()),
            AuthError::MissingToken | AuthError::Unauthorized | AuthError::Inactive => ServiceError::Unauthorized(e.to_string()),
            other => ServiceError::Db(other.to_string()),
        }
    }
}
