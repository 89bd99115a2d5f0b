use argon2::{Argon2, password_hash::{PasswordHasher, PasswordVerifier, SaltString}, PasswordHash};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header as JwtHeader, Validation};
use rand::rngs::OsRng;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use configs::AuthConfig;
use models::enums::Role;
use models::{user, user_credentials};

use super::domain::{AuthSession, Claims, LoginInput};
use super::errors::AuthError;
use crate::repository::{CredentialFilter, Repositories, UserFilter};

pub const PASSWORD_ALGORITHM: &str = "argon2";

/// Argon2id hash in PHC string format with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AuthError::HashError(e.to_string()))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|e| AuthError::HashError(e.to_string()))?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}

/// Auth business service independent of web framework
#[derive(Clone)]
pub struct AuthService {
    repos: Repositories,
    cfg: AuthConfig,
}

impl AuthService {
    pub fn new(repos: Repositories, cfg: AuthConfig) -> Self { Self { repos, cfg } }

    async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, AuthError> {
        let filter = UserFilter { email: Some(user::normalize_email(email)), ..Default::default() };
        Ok(self.repos.users.find_one(&filter).await?)
    }

    /// Create a user row plus its credentials.
    #[instrument(skip(self, password), fields(email = %email, role = %role))]
    pub async fn create_account(&self, email: &str, name: &str, role: Role, password: &str) -> Result<user::Model, AuthError> {
        user::validate_email(email).map_err(|e| AuthError::Validation(e.to_string()))?;
        user::validate_name(name).map_err(|e| AuthError::Validation(e.to_string()))?;
        user::validate_password(password).map_err(|e| AuthError::Validation(e.to_string()))?;
        if let Some(existing) = self.find_by_email(email).await? {
            debug!("user exists: {}", existing.email);
            return Err(AuthError::Conflict);
        }

        let now = Utc::now().into();
        let created = self
            .repos
            .users
            .insert(user::Model {
                id: Uuid::new_v4(),
                email: user::normalize_email(email),
                name: name.trim().to_string(),
                role,
                active: true,
                created_at: now,
                updated_at: now,
            })
            .await?;
        self.set_password(created.id, password).await?;
        info!(user_id = %created.id, email = %created.email, "user_registered");
        Ok(created)
    }

    /// Replace (or create) the stored hash for a user.
    #[instrument(skip(self, password))]
    pub async fn set_password(&self, user_id: Uuid, password: &str) -> Result<(), AuthError> {
        user::validate_password(password).map_err(|e| AuthError::Validation(e.to_string()))?;
        let hash = hash_password(password)?;
        let now = Utc::now().into();
        let existing = self.repos.credentials.find_one(&CredentialFilter { user_id: Some(user_id) }).await?;
        match existing {
            Some(mut cred) => {
                cred.password_hash = hash;
                cred.password_algorithm = PASSWORD_ALGORITHM.to_string();
                cred.updated_at = now;
                self.repos.credentials.update(cred).await?;
            }
            None => {
                self.repos
                    .credentials
                    .insert(user_credentials::Model {
                        id: Uuid::new_v4(),
                        user_id,
                        password_hash: hash,
                        password_algorithm: PASSWORD_ALGORITHM.to_string(),
                        created_at: now,
                        updated_at: now,
                    })
                    .await?;
            }
        }
        Ok(())
    }

    /// Authenticate a user and issue a token.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{AuthService, LoginInput};
    /// use service::repository::Repositories;
    /// use models::enums::Role;
    /// let cfg = configs::AuthConfig { jwt_secret: "secret".into(), ..Default::default() };
    /// let svc = AuthService::new(Repositories::memory(), cfg);
    /// tokio_test::block_on(svc.create_account("u@e.com", "N", Role::Manager, "Passw0rd!")).unwrap();
    /// let session = tokio_test::block_on(svc.login(LoginInput { email: "U@e.com".into(), password: "Passw0rd!".into() })).unwrap();
    /// assert_eq!(session.user.email, "u@e.com");
    /// assert_eq!(svc.decode_token(&session.token).unwrap().role, Role::Manager);
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let user = self.find_by_email(&input.email).await?.ok_or(AuthError::Unauthorized)?;

        let cred = self
            .repos
            .credentials
            .find_one(&CredentialFilter { user_id: Some(user.id) })
            .await?
            .ok_or(AuthError::Unauthorized)?;

        if !verify_password(&input.password, &cred.password_hash)? {
            warn!(user_id = %user.id, "login_failed");
            return Err(AuthError::Unauthorized);
        }
        if !user.active {
            return Err(AuthError::Inactive);
        }

        let token = self.issue_token(&user)?;
        info!(user_id = %user.id, role = %user.role, "login_ok");
        Ok(AuthSession { token, user })
    }

    pub fn issue_token(&self, user: &user::Model) -> Result<String, AuthError> {
        let exp = (Utc::now() + chrono::Duration::hours(self.cfg.token_ttl_hours)).timestamp() as usize;
        let claims = Claims { sub: user.email.clone(), uid: user.id, role: user.role, exp };
        encode(&JwtHeader::default(), &claims, &EncodingKey::from_secret(self.cfg.jwt_secret.as_bytes()))
            .map_err(|e| AuthError::TokenError(e.to_string()))
    }

    /// Verify signature and expiry.
    pub fn decode_token(&self, token: &str) -> Result<Claims, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &DecodingKey::from_secret(self.cfg.jwt_secret.as_bytes()), &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::TokenError(e.to_string()))
    }

    /// Current profile of the token holder; deleted or deactivated users are rejected.
    pub async fn profile(&self, claims: &Claims) -> Result<user::Model, AuthError> {
        let user = self.repos.users.get(claims.uid).await?.ok_or(AuthError::Unauthorized)?;
        if !user.active {
            return Err(AuthError::Inactive);
        }
        Ok(user)
    }

    /// Decode a bearer token and re-check the account behind it. The returned
    /// claims carry the current e-mail and role, not the ones signed at login.
    pub async fn authenticate(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = self.decode_token(token)?;
        let user = self.profile(&claims).await?;
        Ok(Claims { sub: user.email, uid: user.id, role: user.role, exp: claims.exp })
    }

    /// Seed the configured admin when no user exists yet.
    pub async fn bootstrap_admin(&self) -> Result<Option<user::Model>, AuthError> {
        if self.repos.users.find_one(&UserFilter::default()).await?.is_some() {
            return Ok(None);
        }
        let (Some(email), Some(password)) = (&self.cfg.bootstrap_admin_email, &self.cfg.bootstrap_admin_password) else {
            warn!("no users and no bootstrap admin configured; set ADMIN_EMAIL and ADMIN_PASSWORD");
            return Ok(None);
        };
        let admin = self.create_account(email, "Administrator", Role::Admin, password).await?;
        info!(event = "bootstrap_admin", user_id = %admin.id, "seeded admin account");
        Ok(Some(admin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn svc() -> AuthService {
        let cfg = AuthConfig {
            jwt_secret: "test-secret".into(),
            bootstrap_admin_email: Some("boss@garage.test".into()),
            bootstrap_admin_password: Some("changeme123".into()),
            ..Default::default()
        };
        AuthService::new(Repositories::memory(), cfg)
    }

    #[tokio::test]
    async fn login_rejects_wrong_password_and_inactive_users() -> Result<(), anyhow::Error> {
        let svc = svc();
        let mut u = svc.create_account("mech@garage.test", "Mec", Role::Mechanic, "wrenches!").await?;

        let bad = svc.login(LoginInput { email: "mech@garage.test".into(), password: "nope-nope".into() }).await;
        assert!(matches!(bad, Err(AuthError::Unauthorized)));
        let unknown = svc.login(LoginInput { email: "ghost@garage.test".into(), password: "wrenches!".into() }).await;
        assert!(matches!(unknown, Err(AuthError::Unauthorized)));

        u.active = false;
        svc.repos.users.update(u).await?;
        let inactive = svc.login(LoginInput { email: "mech@garage.test".into(), password: "wrenches!".into() }).await;
        assert!(matches!(inactive, Err(AuthError::Inactive)));
        Ok(())
    }

    #[tokio::test]
    async fn token_round_trip_and_tampering() -> Result<(), anyhow::Error> {
        let svc = svc();
        let u = svc.create_account("ana@garage.test", "Ana", Role::Receptionist, "frontdesk1").await?;
        let token = svc.issue_token(&u)?;
        let claims = svc.decode_token(&token)?;
        assert_eq!(claims.uid, u.id);
        assert_eq!(claims.sub, "ana@garage.test");
        assert_eq!(claims.role, Role::Receptionist);
        assert_eq!(svc.profile(&claims).await?.id, u.id);

        let other = AuthService::new(Repositories::memory(), AuthConfig { jwt_secret: "other".into(), ..Default::default() });
        assert!(other.decode_token(&token).is_err());
        assert!(svc.decode_token("not.a.jwt").is_err());
        Ok(())
    }

    #[tokio::test]
    async fn authenticate_tracks_current_account_state() -> Result<(), anyhow::Error> {
        let svc = svc();
        let mut u = svc.create_account("pau@garage.test", "Pau", Role::Manager, "managing1").await?;
        let token = svc.issue_token(&u)?;

        u.role = Role::Mechanic;
        svc.repos.users.update(u.clone()).await?;
        assert_eq!(svc.authenticate(&token).await?.role, Role::Mechanic);

        u.active = false;
        svc.repos.users.update(u.clone()).await?;
        assert!(matches!(svc.authenticate(&token).await, Err(AuthError::Inactive)));

        svc.repos.users.delete(u.id).await?;
        assert!(matches!(svc.authenticate(&token).await, Err(AuthError::Unauthorized)));
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_email_is_conflict_case_insensitive() -> Result<(), anyhow::Error> {
        let svc = svc();
        svc.create_account("dup@garage.test", "One", Role::Manager, "password1").await?;
        let dup = svc.create_account("DUP@garage.test", "Two", Role::Manager, "password2").await;
        assert!(matches!(dup, Err(AuthError::Conflict)));
        Ok(())
    }

    #[tokio::test]
    async fn bootstrap_only_seeds_empty_store() -> Result<(), anyhow::Error> {
        let svc = svc();
        let admin = svc.bootstrap_admin().await?.expect("seeded");
        assert_eq!(admin.role, Role::Admin);
        assert!(svc.bootstrap_admin().await?.is_none());
        let session = svc.login(LoginInput { email: "boss@garage.test".into(), password: "changeme123".into() }).await?;
        assert_eq!(session.user.id, admin.id);
        Ok(())
    }

    #[tokio::test]
    async fn set_password_replaces_hash() -> Result<(), anyhow::Error> {
        let svc = svc();
        let u = svc.create_account("r@garage.test", "R", Role::Manager, "first-pass").await?;
        svc.set_password(u.id, "second-pass").await?;
        assert!(svc.login(LoginInput { email: "r@garage.test".into(), password: "first-pass".into() }).await.is_err());
        assert!(svc.login(LoginInput { email: "r@garage.test".into(), password: "second-pass".into() }).await.is_ok());
        Ok(())
    }
}
