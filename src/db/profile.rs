use crate::models::{PredefinedResponse, Profile, User, ROLE_ADMIN, ROLE_SUPERADMIN};
use sqlx::PgPool;
use tracing::Instrument;
use uuid::Uuid;

const PROFILE_COLUMNS: &str = "id, organization_id, email, full_name, role, updated_at";

#[tracing::instrument(name = "Upsert profile.", skip(pool, user), fields(user_id = %user.id))]
pub async fn upsert(pool: &PgPool, user: &User) -> Result<Profile, String> {
    let query = format!(
        r#"INSERT INTO profiles (id, organization_id, email, full_name, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (id) DO UPDATE SET
            organization_id = EXCLUDED.organization_id,
            email = EXCLUDED.email,
            full_name = EXCLUDED.full_name,
            role = EXCLUDED.role,
            updated_at = NOW()
        RETURNING {PROFILE_COLUMNS}"#
    );
    sqlx::query_as::<_, Profile>(&query)
        .bind(user.id)
        .bind(user.organization_id)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.role)
        .fetch_one(pool)
        .await
        .map_err(|err| {
            tracing::error!("Failed to upsert profile: {:?}", err);
            "Failed to save profile".to_string()
        })
}

/// Agents of an organization, by name.
pub async fn fetch_admins(pool: &PgPool, organization_id: Uuid) -> Result<Vec<Profile>, String> {
    let query = format!(
        r#"SELECT {PROFILE_COLUMNS} FROM profiles
        WHERE organization_id = $1 AND role = ANY($2)
        ORDER BY full_name NULLS LAST, email"#
    );
    let query_span = tracing::info_span!("Select admin profiles.");
    sqlx::query_as::<_, Profile>(&query)
        .bind(organization_id)
        .bind(vec![ROLE_ADMIN, ROLE_SUPERADMIN])
        .fetch_all(pool)
        .instrument(query_span)
        .await
        .map_err(|err| {
            tracing::error!("Failed to fetch admin profiles: {:?}", err);
            "Failed to fetch admins".to_string()
        })
}

pub async fn is_admin_of(pool: &PgPool, id: Uuid, organization_id: Uuid) -> Result<bool, String> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM profiles WHERE id = $1 AND organization_id = $2 AND role = ANY($3))",
    )
    .bind(id)
    .bind(organization_id)
    .bind(vec![ROLE_ADMIN, ROLE_SUPERADMIN])
    .fetch_one(pool)
    .await
    .map_err(|err| {
        tracing::error!("Failed to check profile {}: {:?}", id, err);
        "Failed to check assignee".to_string()
    })
}

/// Active canned replies of an organization, by title.
pub async fn fetch_predefined_responses(
    pool: &PgPool,
    organization_id: Uuid,
) -> Result<Vec<PredefinedResponse>, String> {
    sqlx::query_as::<_, PredefinedResponse>(
        r#"SELECT id, organization_id, title, message, is_active, created_at
        FROM predefined_responses
        WHERE organization_id = $1 AND is_active
        ORDER BY title"#,
    )
    .bind(organization_id)
    .fetch_all(pool)
    .await
    .map_err(|err| {
        tracing::error!("Failed to fetch predefined responses: {:?}", err);
        "Failed to fetch predefined responses".to_string()
    })
}
