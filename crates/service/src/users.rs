//! Staff accounts (admin only at the HTTP layer).

use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use common::types::Page;
use models::enums::Role;
use models::user;

use crate::auth::AuthService;
use crate::errors::ServiceError;
use crate::pagination::Pagination;
use crate::repository::{CredentialFilter, Repositories, UserFilter};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub name: String,
    pub role: Role,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub role: Option<Role>,
    pub active: Option<bool>,
}

#[derive(Clone)]
pub struct UserService {
    repos: Repositories,
    auth: AuthService,
}

impl UserService {
    pub fn new(repos: Repositories, auth: AuthService) -> Self { Self { repos, auth } }

    pub async fn list(&self, filter: UserFilter, page: Pagination) -> Result<Page<user::Model>, ServiceError> {
        let (rows, total) = self.repos.users.find(&filter, Some(page)).await?;
        Ok(page.page_of(rows, total))
    }

    pub async fn get(&self, id: Uuid) -> Result<user::Model, ServiceError> {
        self.repos.users.get(id).await?.ok_or_else(|| ServiceError::not_found("user"))
    }

    pub async fn create(&self, input: CreateUser) -> Result<user::Model, ServiceError> {
        Ok(self.auth.create_account(&input.email, &input.name, input.role, &input.password).await?)
    }

    /// `actor` is the calling admin; they may not lock themselves out.
    #[instrument(skip(self, input))]
    pub async fn update(&self, actor: Uuid, id: Uuid, input: UpdateUser) -> Result<user::Model, ServiceError> {
        let mut u = self.get(id).await?;
        if actor == id {
            if input.active == Some(false) {
                return Err(ServiceError::invalid_state("cannot deactivate your own account"));
            }
            if input.role.is_some_and(|r| r != Role::Admin) && u.role == Role::Admin {
                return Err(ServiceError::invalid_state("cannot drop your own admin role"));
            }
        }
        if let Some(name) = input.name {
            user::validate_name(&name)?;
            u.name = name.trim().to_string();
        }
        if let Some(role) = input.role { u.role = role; }
        if let Some(active) = input.active { u.active = active; }
        u.updated_at = crate::now();
        let saved = self.repos.users.update(u).await?;
        info!(user_id = %saved.id, role = %saved.role, active = saved.active, "user_updated");
        Ok(saved)
    }

    pub async fn reset_password(&self, id: Uuid, password: &str) -> Result<(), ServiceError> {
        self.get(id).await?;
        self.auth.set_password(id, password).await?;
        info!(user_id = %id, "password_reset");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, actor: Uuid, id: Uuid) -> Result<(), ServiceError> {
        if actor == id {
            return Err(ServiceError::invalid_state("cannot delete your own account"));
        }
        self.get(id).await?;
        if let Some(cred) = self.repos.credentials.find_one(&CredentialFilter { user_id: Some(id) }).await? {
            self.repos.credentials.delete(cred.id).await?;
        }
        self.repos.users.delete(id).await?;
        info!(user_id = %id, "user_deleted");
        Ok(())
    }
}
