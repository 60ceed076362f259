use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text")]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum SelectedModelType {
    Default,
    User,
}

/// Model credentials and prompt settings, from either `ai_models_default` or `ai_models`.
#[derive(Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AiModel {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub endpoint: Option<String>,
    pub max_tokens: i32,
    pub system_message: String,
}

impl std::fmt::Debug for AiModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiModel")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AiUserSettings {
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub default_model_id: Option<Uuid>,
    pub user_model_id: Option<Uuid>,
    pub selected_model_type: SelectedModelType,
}
