use serde::{Deserialize, Serialize};
use uuid::Uuid;

use models::enums::Role;

/// Login input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// JWT payload. `sub` is the e-mail, `uid` the user id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub uid: Uuid,
    pub role: Role,
    pub exp: usize,
}

impl Claims {
    /// `admin` passes every role check.
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        self.role == Role::Admin || roles.contains(&self.role)
    }
}

/// Login result (session)
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub user: models::user::Model,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: Role) -> Claims {
        Claims { sub: "x@y.z".into(), uid: Uuid::new_v4(), role, exp: 0 }
    }

    #[test]
    fn admin_passes_every_guard() {
        assert!(claims(Role::Admin).has_any_role(&[Role::Manager]));
        assert!(claims(Role::Admin).has_any_role(&[]));
        assert!(claims(Role::Manager).has_any_role(&[Role::Admin, Role::Manager]));
        assert!(!claims(Role::Mechanic).has_any_role(&[Role::Admin, Role::Manager]));
    }
}
