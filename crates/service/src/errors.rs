use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("database error: {0}")]
    Db(String),
    #[error("model error: {0}")]
    Model(#[from] models::errors::ModelError),
    #[error("export error: {0}")]
    Export(String),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    pub fn validation(msg: impl Into<String>) -> Self { Self::Validation(msg.into()) }

    pub fn invalid_state(msg: impl Into<String>) -> Self { Self::InvalidState(msg.into()) }

    /// Map driver errors, surfacing unique-constraint violations as conflicts.
    pub fn from_db(e: sea_orm::DbErr) -> Self {
        let msg = e.to_string();
        if msg.contains("duplicate key value") || msg.contains("UNIQUE constraint failed") {
            Self::Conflict(msg)
        } else if msg.contains("violates foreign key constraint") {
            Self::InvalidState(msg)
        } else {
            Self::Db(msg)
        }
    }
}
