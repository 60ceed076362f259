use crate::models::{AiModel, AiUserSettings, SelectedModelType};
use sqlx::PgPool;
use uuid::Uuid;

const MODEL_COLUMNS: &str = "id, name, api_key, endpoint, max_tokens, system_message";

pub async fn fetch_settings(pool: &PgPool, user_id: Uuid) -> Result<Option<AiUserSettings>, String> {
    sqlx::query_as::<_, AiUserSettings>(
        r#"SELECT user_id, organization_id, default_model_id, user_model_id, selected_model_type
        FROM ai_user_settings WHERE user_id = $1"#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(|err| {
        tracing::error!("Failed to fetch AI settings: {:?}", err);
        "Failed to fetch AI settings".to_string()
    })
}

#[tracing::instrument(name = "Insert AI settings.", skip(pool))]
pub async fn insert_settings(
    pool: &PgPool,
    settings: &AiUserSettings,
) -> Result<AiUserSettings, String> {
    sqlx::query_as::<_, AiUserSettings>(
        r#"INSERT INTO ai_user_settings (user_id, organization_id, default_model_id, user_model_id, selected_model_type)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (user_id) DO UPDATE SET default_model_id = EXCLUDED.default_model_id
        RETURNING user_id, organization_id, default_model_id, user_model_id, selected_model_type"#,
    )
    .bind(settings.user_id)
    .bind(settings.organization_id)
    .bind(settings.default_model_id)
    .bind(settings.user_model_id)
    .bind(settings.selected_model_type)
    .fetch_one(pool)
    .await
    .map_err(|err| {
        tracing::error!("Failed to insert AI settings: {:?}", err);
        "Failed to save AI settings".to_string()
    })
}

/// Active organization default that plain users may access.
pub async fn fetch_organization_default(
    pool: &PgPool,
    organization_id: Uuid,
) -> Result<Option<AiModel>, String> {
    let query = format!(
        r#"SELECT {MODEL_COLUMNS} FROM ai_models_default
        WHERE organization_id = $1 AND is_active = TRUE AND user_role_to_access = 'user'
        ORDER BY created_at
        LIMIT 1"#
    );
    sqlx::query_as::<_, AiModel>(&query)
        .bind(organization_id)
        .fetch_optional(pool)
        .await
        .map_err(|err| {
            tracing::error!("Failed to fetch organization default model: {:?}", err);
            "Failed to fetch default model".to_string()
        })
}

pub async fn fetch_any_active_default(pool: &PgPool) -> Result<Option<AiModel>, String> {
    let query = format!(
        r#"SELECT {MODEL_COLUMNS} FROM ai_models_default
        WHERE is_active = TRUE AND user_role_to_access = 'user'
        ORDER BY created_at
        LIMIT 1"#
    );
    sqlx::query_as::<_, AiModel>(&query)
        .fetch_optional(pool)
        .await
        .map_err(|err| {
            tracing::error!("Failed to fetch active default model: {:?}", err);
            "Failed to fetch default model".to_string()
        })
}

/// The model the settings point at. A user model must belong to the caller.
pub async fn fetch_selected_model(
    pool: &PgPool,
    settings: &AiUserSettings,
) -> Result<Option<AiModel>, String> {
    let result = match settings.selected_model_type {
        SelectedModelType::Default => {
            let Some(id) = settings.default_model_id else {
                return Ok(None);
            };
            let query = format!("SELECT {MODEL_COLUMNS} FROM ai_models_default WHERE id = $1");
            sqlx::query_as::<_, AiModel>(&query)
                .bind(id)
                .fetch_optional(pool)
                .await
        }
        SelectedModelType::User => {
            let Some(id) = settings.user_model_id else {
                return Ok(None);
            };
            let query =
                format!("SELECT {MODEL_COLUMNS} FROM ai_models WHERE id = $1 AND user_id = $2");
            sqlx::query_as::<_, AiModel>(&query)
                .bind(id)
                .bind(settings.user_id)
                .fetch_optional(pool)
                .await
        }
    };

    result.map_err(|err| {
        tracing::error!("Failed to fetch selected model: {:?}", err);
        "Failed to fetch model".to_string()
    })
}
