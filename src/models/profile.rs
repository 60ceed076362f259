use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Local copy of an authenticated user, refreshed on sign-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub role: String,
    pub updated_at: DateTime<Utc>,
}

/// Canned reply an agent can drop into the composer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PredefinedResponse {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub title: String,
    pub message: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
