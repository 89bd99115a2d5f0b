//! Auth module: domain types, errors and the login/token service.
//!
//! Password hashes live in `user_credentials`; tokens are HS256 JWTs
//! carrying the caller's id and role.

pub mod domain;
pub mod errors;
pub mod service;

pub use domain::{AuthSession, Claims, LoginInput};
pub use errors::AuthError;
pub use service::{hash_password, verify_password, AuthService};
