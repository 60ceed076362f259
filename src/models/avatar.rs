use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Admin persona a response can be signed with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Avatar {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub title: String,
    pub full_name: Option<String>,
    pub image: Option<String>,
}
