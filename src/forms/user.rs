use crate::models::user::User as UserModel;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use uuid::Uuid;

/// Body of the auth service's `GET {auth_url}` answer.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserForm {
    pub user: User,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub organization_id: Option<String>,
}

impl TryFrom<UserForm> for UserModel {
    type Error = String;

    fn try_from(form: UserForm) -> Result<Self, Self::Error> {
        let user = form.user;
        let id = Uuid::parse_str(&user.id).map_err(|_| "user id is not a uuid".to_string())?;
        let organization_id = user
            .organization_id
            .as_deref()
            .ok_or_else(|| "user has no organization".to_string())
            .and_then(|org| Uuid::parse_str(org).map_err(|_| "organization id is not a uuid".to_string()))?;

        Ok(UserModel {
            id,
            email: user.email,
            full_name: user.full_name,
            role: user.role.unwrap_or_else(|| "user".to_string()),
            organization_id,
            access_token: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_answer_becomes_user() {
        let id = Uuid::new_v4();
        let org = Uuid::new_v4();
        let form: UserForm = serde_json::from_value(serde_json::json!({
            "user": {
                "id": id.to_string(),
                "email": "agent@example.com",
                "role": "admin",
                "organization_id": org.to_string()
            }
        }))
        .unwrap();
        let user = UserModel::try_from(form).unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.organization_id, org);
        assert!(user.is_admin());
    }

    #[test]
    fn test_missing_role_defaults_to_user_and_org_is_required() {
        let mut form = UserForm {
            user: User {
                id: Uuid::new_v4().to_string(),
                email: "x@example.com".to_string(),
                organization_id: Some(Uuid::new_v4().to_string()),
                ..Default::default()
            },
        };
        let user = UserModel::try_from(form.clone()).unwrap();
        assert_eq!(user.role, "user");

        form.user.organization_id = None;
        assert!(UserModel::try_from(form).is_err());
    }
}
