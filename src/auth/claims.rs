use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::users::Role;

/// JWT payload issued at login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,     // user ID
    pub email: String, // email at issue time
    pub role: Role,    // role claim
    pub iat: usize,    // issued at (unix timestamp)
    pub exp: usize,    // expires at (unix timestamp)
    pub iss: String,   // issuer
    pub aud: String,   // audience
}

/// Things a caller may be allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ManageUsers,
    EditOwnProfile,
}

impl Capability {
    pub fn granted_to(self, role: Role) -> bool {
        match self {
            Capability::ManageUsers => role == Role::Admin,
            Capability::EditOwnProfile => true,
        }
    }

    fn denial(self) -> &'static str {
        match self {
            Capability::ManageUsers => "Access denied. Admin privileges required.",
            Capability::EditOwnProfile => "Access denied.",
        }
    }
}

impl Claims {
    pub fn require(&self, capability: Capability) -> AppResult<()> {
        if capability.granted_to(self.role) {
            Ok(())
        } else {
            Err(AppError::Authorization(capability.denial().into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: Role) -> Claims {
        Claims {
            sub: Uuid::new_v4(),
            email: "ann@x.com".into(),
            role,
            iat: 0,
            exp: 0,
            iss: "iss".into(),
            aud: "aud".into(),
        }
    }

    #[test]
    fn only_admins_manage_users() {
        assert!(claims(Role::Admin).require(Capability::ManageUsers).is_ok());
        let err = claims(Role::User)
            .require(Capability::ManageUsers)
            .unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));
    }

    #[test]
    fn everyone_edits_own_profile() {
        assert!(claims(Role::User).require(Capability::EditOwnProfile).is_ok());
        assert!(claims(Role::Admin).require(Capability::EditOwnProfile).is_ok());
    }

    #[test]
    fn role_claim_serializes_lowercase() {
        let json = serde_json::to_value(claims(Role::Admin)).unwrap();
        assert_eq!(json["role"], "admin");
    }
}
