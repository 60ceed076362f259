//! Picks the model a user chats with and forwards the conversation to it.

use crate::connectors::{ChatCompletion, ChatMessage, LlmError};
use crate::db;
use crate::models::{AiModel, AiUserSettings, SelectedModelType, User};
use async_trait::async_trait;
use sqlx::PgPool;

pub const NO_DEFAULT_MODEL: &str = "No default model available. Please contact an admin.";
pub const MODEL_NOT_FOUND: &str = "Model not found";
pub const MESSAGES_REQUIRED: &str = "Messages array is required";
pub const UNSUPPORTED_MODEL: &str = "Unsupported model";
pub const PROCESSING_FAILED: &str = "Error processing request";

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("{}", MESSAGES_REQUIRED)]
    NoMessages,
    #[error("{}", NO_DEFAULT_MODEL)]
    NoDefaultModel,
    #[error("{}", MODEL_NOT_FOUND)]
    ModelNotFound,
    #[error("{}", UNSUPPORTED_MODEL)]
    UnsupportedModel,
    #[error("{}", PROCESSING_FAILED)]
    Provider(#[source] LlmError),
    #[error("{0}")]
    Storage(String),
}

impl From<LlmError> for ChatError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::UnsupportedModel(_) => ChatError::UnsupportedModel,
            other => ChatError::Provider(other),
        }
    }
}

/// Where settings and model rows come from.
#[async_trait]
pub trait ModelDirectory: Send + Sync {
    async fn settings(&self, user_id: uuid::Uuid) -> Result<Option<AiUserSettings>, String>;
    async fn organization_default(
        &self,
        organization_id: uuid::Uuid,
    ) -> Result<Option<AiModel>, String>;
    async fn any_active_default(&self) -> Result<Option<AiModel>, String>;
    async fn save_settings(&self, settings: &AiUserSettings) -> Result<AiUserSettings, String>;
    async fn selected_model(&self, settings: &AiUserSettings) -> Result<Option<AiModel>, String>;
}

#[async_trait]
impl ModelDirectory for PgPool {
    async fn settings(&self, user_id: uuid::Uuid) -> Result<Option<AiUserSettings>, String> {
        db::ai::fetch_settings(self, user_id).await
    }

    async fn organization_default(
        &self,
        organization_id: uuid::Uuid,
    ) -> Result<Option<AiModel>, String> {
        db::ai::fetch_organization_default(self, organization_id).await
    }

    async fn any_active_default(&self) -> Result<Option<AiModel>, String> {
        db::ai::fetch_any_active_default(self).await
    }

    async fn save_settings(&self, settings: &AiUserSettings) -> Result<AiUserSettings, String> {
        db::ai::insert_settings(self, settings).await
    }

    async fn selected_model(&self, settings: &AiUserSettings) -> Result<Option<AiModel>, String> {
        db::ai::fetch_selected_model(self, settings).await
    }
}

/// Settings of the user, created on first use from the organization default or,
/// failing that, any active default model.
#[tracing::instrument(name = "Resolve chat settings.", skip(directory, user), fields(user = %user.id))]
pub async fn resolve_settings(
    directory: &dyn ModelDirectory,
    user: &User,
) -> Result<AiUserSettings, ChatError> {
    if let Some(settings) = directory.settings(user.id).await.map_err(ChatError::Storage)? {
        return Ok(settings);
    }

    let default_model = match directory
        .organization_default(user.organization_id)
        .await
        .map_err(ChatError::Storage)?
    {
        Some(model) => model,
        None => {
            tracing::warn!(
                "No default model for organization {}, falling back to any active model",
                user.organization_id
            );
            directory
                .any_active_default()
                .await
                .map_err(ChatError::Storage)?
                .ok_or(ChatError::NoDefaultModel)?
        }
    };

    let settings = AiUserSettings {
        user_id: user.id,
        organization_id: user.organization_id,
        default_model_id: Some(default_model.id),
        user_model_id: None,
        selected_model_type: SelectedModelType::Default,
    };
    directory
        .save_settings(&settings)
        .await
        .map_err(ChatError::Storage)
}

pub async fn resolve_model(
    directory: &dyn ModelDirectory,
    user: &User,
) -> Result<AiModel, ChatError> {
    let settings = resolve_settings(directory, user).await?;
    directory
        .selected_model(&settings)
        .await
        .map_err(ChatError::Storage)?
        .ok_or(ChatError::ModelNotFound)
}

/// Answer `messages` with the user's model.
pub async fn reply(
    directory: &dyn ModelDirectory,
    provider: &dyn ChatCompletion,
    user: &User,
    messages: &[ChatMessage],
) -> Result<String, ChatError> {
    if messages.is_empty() {
        return Err(ChatError::NoMessages);
    }
    let model = resolve_model(directory, user).await?;
    tracing::info!("Using model {}", model.name);
    provider.complete(&model, messages).await.map_err(|err| {
        tracing::error!("Chat provider failed: {}", err);
        ChatError::from(err)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use uuid::Uuid;

    fn model(name: &str) -> AiModel {
        AiModel {
            id: Uuid::new_v4(),
            name: name.to_string(),
            api_key: "key".to_string(),
            endpoint: None,
            max_tokens: 256,
            system_message: "You are helpful".to_string(),
        }
    }

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "learner@example.com".to_string(),
            full_name: None,
            role: "user".to_string(),
            organization_id: Uuid::new_v4(),
            access_token: None,
        }
    }

    #[derive(Default)]
    struct MemoryDirectory {
        settings: Mutex<Option<AiUserSettings>>,
        organization_default: Option<AiModel>,
        any_default: Option<AiModel>,
        models: Vec<AiModel>,
    }

    #[async_trait]
    impl ModelDirectory for MemoryDirectory {
        async fn settings(&self, _user_id: Uuid) -> Result<Option<AiUserSettings>, String> {
            Ok(self.settings.lock().unwrap().clone())
        }
        async fn organization_default(&self, _org: Uuid) -> Result<Option<AiModel>, String> {
            Ok(self.organization_default.clone())
        }
        async fn any_active_default(&self) -> Result<Option<AiModel>, String> {
            Ok(self.any_default.clone())
        }
        async fn save_settings(&self, s: &AiUserSettings) -> Result<AiUserSettings, String> {
            *self.settings.lock().unwrap() = Some(s.clone());
            Ok(s.clone())
        }
        async fn selected_model(&self, s: &AiUserSettings) -> Result<Option<AiModel>, String> {
            let id = match s.selected_model_type {
                SelectedModelType::Default => s.default_model_id,
                SelectedModelType::User => s.user_model_id,
            };
            Ok(self.models.iter().find(|m| Some(m.id) == id).cloned())
        }
    }

    struct Echo;

    #[async_trait]
    impl ChatCompletion for Echo {
        async fn complete(&self, model: &AiModel, messages: &[ChatMessage]) -> Result<String, LlmError> {
            if crate::connectors::ProviderKind::for_model(&model.name).is_none() {
                return Err(LlmError::UnsupportedModel(model.name.clone()));
            }
            Ok(format!("{}:{}", model.name, messages.len()))
        }
    }

    #[tokio::test]
    async fn test_organization_default_is_preferred() {
        let org_model = model("gpt-4o");
        let any_model = model("claude-3");
        let directory = MemoryDirectory {
            organization_default: Some(org_model.clone()),
            any_default: Some(any_model.clone()),
            models: vec![org_model.clone(), any_model],
            ..Default::default()
        };
        let user = user();

        let resolved = resolve_model(&directory, &user).await.unwrap();
        assert_eq!(resolved.id, org_model.id);

        let saved = directory.settings.lock().unwrap().clone().unwrap();
        assert_eq!(saved.selected_model_type, SelectedModelType::Default);
        assert_eq!(saved.default_model_id, Some(org_model.id));
        assert_eq!(saved.organization_id, user.organization_id);
    }

    #[tokio::test]
    async fn test_falls_back_to_any_active_default() {
        let any_model = model("deepseek-chat");
        let directory = MemoryDirectory {
            any_default: Some(any_model.clone()),
            models: vec![any_model.clone()],
            ..Default::default()
        };
        let resolved = resolve_model(&directory, &user()).await.unwrap();
        assert_eq!(resolved.id, any_model.id);
    }

    #[tokio::test]
    async fn test_no_default_model_anywhere() {
        let directory = MemoryDirectory::default();
        let err = resolve_model(&directory, &user()).await.unwrap_err();
        assert!(matches!(err, ChatError::NoDefaultModel));
        assert_eq!(err.to_string(), NO_DEFAULT_MODEL);
    }

    #[tokio::test]
    async fn test_existing_settings_win_and_missing_model_is_reported() {
        let user = user();
        let directory = MemoryDirectory {
            settings: Mutex::new(Some(AiUserSettings {
                user_id: user.id,
                organization_id: user.organization_id,
                default_model_id: None,
                user_model_id: Some(Uuid::new_v4()),
                selected_model_type: SelectedModelType::User,
            })),
            organization_default: Some(model("gpt-4o")),
            ..Default::default()
        };
        let err = resolve_model(&directory, &user).await.unwrap_err();
        assert!(matches!(err, ChatError::ModelNotFound));
    }

    #[tokio::test]
    async fn test_reply_validates_and_dispatches() {
        let gpt = model("gpt-4o-mini");
        let directory = MemoryDirectory {
            organization_default: Some(gpt.clone()),
            models: vec![gpt],
            ..Default::default()
        };
        let user = user();

        let err = reply(&directory, &Echo, &user, &[]).await.unwrap_err();
        assert_eq!(err.to_string(), MESSAGES_REQUIRED);

        let answer = reply(&directory, &Echo, &user, &[ChatMessage::user("hi")])
            .await
            .unwrap();
        assert_eq!(answer, "gpt-4o-mini:1");
    }

    #[tokio::test]
    async fn test_unknown_model_name_is_unsupported() {
        let gemini = model("gemini-pro");
        let directory = MemoryDirectory {
            organization_default: Some(gemini.clone()),
            models: vec![gemini],
            ..Default::default()
        };
        let err = reply(&directory, &Echo, &user(), &[ChatMessage::user("hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::UnsupportedModel));
    }
}
