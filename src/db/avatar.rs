use crate::models::Avatar;
use sqlx::PgPool;
use uuid::Uuid;

#[tracing::instrument(name = "Fetch organization avatars.", skip(pool))]
pub async fn fetch_by_organization(
    pool: &PgPool,
    organization_id: Uuid,
) -> Result<Vec<Avatar>, String> {
    sqlx::query_as::<_, Avatar>(
        "SELECT id, organization_id, title, full_name, image FROM ticket_avatars WHERE organization_id = $1 ORDER BY title",
    )
    .bind(organization_id)
    .fetch_all(pool)
    .await
    .map_err(|err| {
        tracing::error!("Failed to fetch avatars: {:?}", err);
        "Failed to fetch avatars".to_string()
    })
}

pub async fn belongs_to(
    pool: &PgPool,
    avatar_id: Uuid,
    organization_id: Uuid,
) -> Result<bool, String> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM ticket_avatars WHERE id = $1 AND organization_id = $2)",
    )
    .bind(avatar_id)
    .bind(organization_id)
    .fetch_one(pool)
    .await
    .map_err(|err| {
        tracing::error!("Failed to check avatar: {:?}", err);
        "Failed to check avatar".to_string()
    })
}
