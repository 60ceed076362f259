use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_SUPERADMIN: &str = "superadmin";

/// Authenticated caller, resolved from the bearer token by the auth service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub role: String,
    pub organization_id: Uuid,
    #[serde(skip)]
    pub access_token: Option<String>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN || self.role == ROLE_SUPERADMIN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: &str) -> User {
        User {
            id: Uuid::new_v4(),
            email: "someone@example.com".to_string(),
            full_name: None,
            role: role.to_string(),
            organization_id: Uuid::new_v4(),
            access_token: None,
        }
    }

    #[test]
    fn test_admin_roles() {
        assert!(user("admin").is_admin());
        assert!(user("superadmin").is_admin());
        assert!(!user("user").is_admin());
        assert!(!user("").is_admin());
    }
}
