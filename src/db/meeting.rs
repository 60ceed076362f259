use crate::models::{Meeting, MeetingStatus};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

const MEETING_COLUMNS: &str =
    "id, organization_id, customer_id, title, starts_at, ends_at, status, notes, created_at, updated_at";

#[tracing::instrument(name = "Fetch meetings.", skip(pool))]
pub async fn fetch_by_organization(
    pool: &PgPool,
    organization_id: Uuid,
    customer_id: Option<Uuid>,
) -> Result<Vec<Meeting>, String> {
    let query = format!(
        r#"SELECT {MEETING_COLUMNS} FROM meetings
        WHERE organization_id = $1 AND ($2::uuid IS NULL OR customer_id = $2)
        ORDER BY starts_at"#
    );
    sqlx::query_as::<_, Meeting>(&query)
        .bind(organization_id)
        .bind(customer_id)
        .fetch_all(pool)
        .await
        .map_err(|err| {
            tracing::error!("Failed to fetch meetings: {:?}", err);
            "Failed to fetch meetings".to_string()
        })
}

pub async fn fetch(pool: &PgPool, id: Uuid) -> Result<Option<Meeting>, String> {
    let query = format!("SELECT {MEETING_COLUMNS} FROM meetings WHERE id = $1");
    sqlx::query_as::<_, Meeting>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|err| {
            tracing::error!("Failed to fetch meeting {}: {:?}", id, err);
            "Failed to fetch meeting".to_string()
        })
}

#[derive(Debug, Clone)]
pub struct MeetingFields {
    pub customer_id: Option<Uuid>,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: MeetingStatus,
    pub notes: Option<String>,
}

#[tracing::instrument(name = "Insert meeting.", skip(pool, fields))]
pub async fn insert(
    pool: &PgPool,
    organization_id: Uuid,
    fields: &MeetingFields,
) -> Result<Meeting, String> {
    let query = format!(
        r#"INSERT INTO meetings (organization_id, customer_id, title, starts_at, ends_at, status, notes)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {MEETING_COLUMNS}"#
    );
    sqlx::query_as::<_, Meeting>(&query)
        .bind(organization_id)
        .bind(fields.customer_id)
        .bind(&fields.title)
        .bind(fields.starts_at)
        .bind(fields.ends_at)
        .bind(fields.status)
        .bind(&fields.notes)
        .fetch_one(pool)
        .await
        .map_err(|err| {
            tracing::error!("Failed to insert meeting: {:?}", err);
            "Failed to save meeting".to_string()
        })
}

#[tracing::instrument(name = "Update meeting.", skip(pool, fields))]
pub async fn update(
    pool: &PgPool,
    id: Uuid,
    fields: &MeetingFields,
) -> Result<Option<Meeting>, String> {
    let query = format!(
        r#"UPDATE meetings SET customer_id = $2, title = $3, starts_at = $4, ends_at = $5,
            status = $6, notes = $7, updated_at = NOW()
        WHERE id = $1
        RETURNING {MEETING_COLUMNS}"#
    );
    sqlx::query_as::<_, Meeting>(&query)
        .bind(id)
        .bind(fields.customer_id)
        .bind(&fields.title)
        .bind(fields.starts_at)
        .bind(fields.ends_at)
        .bind(fields.status)
        .bind(&fields.notes)
        .fetch_optional(pool)
        .await
        .map_err(|err| {
            tracing::error!("Failed to update meeting {}: {:?}", id, err);
            "Failed to save meeting".to_string()
        })
}

#[tracing::instrument(name = "Delete meeting.", skip(pool))]
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, String> {
    sqlx::query("DELETE FROM meetings WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map(|result| result.rows_affected() > 0)
        .map_err(|err| {
            tracing::error!("Failed to delete meeting {}: {:?}", id, err);
            "Failed to delete meeting".to_string()
        })
}
