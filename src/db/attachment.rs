use crate::models::Attachment;
use sqlx::{PgConnection, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

const ATTACHMENT_COLUMNS: &str =
    "id, response_id, ticket_id, file_path, file_name, file_size, file_type, uploaded_by, created_at";

/// Metadata of a file already stored in object storage.
#[derive(Debug, Clone)]
pub struct NewAttachment {
    pub file_path: String,
    pub file_name: String,
    pub file_size: i64,
    pub file_type: String,
}

pub async fn fetch_by_responses(
    pool: &PgPool,
    response_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<Attachment>>, String> {
    if response_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let query = format!(
        "SELECT {ATTACHMENT_COLUMNS} FROM ticket_attachments WHERE response_id = ANY($1) ORDER BY created_at, id"
    );
    let rows = sqlx::query_as::<_, Attachment>(&query)
        .bind(response_ids)
        .fetch_all(pool)
        .await
        .map_err(|err| {
            tracing::error!("Failed to fetch attachments: {:?}", err);
            "Failed to fetch attachments".to_string()
        })?;

    let mut grouped: HashMap<Uuid, Vec<Attachment>> = HashMap::new();
    for attachment in rows {
        grouped.entry(attachment.response_id).or_default().push(attachment);
    }
    Ok(grouped)
}

pub async fn fetch(pool: &PgPool, id: Uuid) -> Result<Option<Attachment>, String> {
    let query = format!("SELECT {ATTACHMENT_COLUMNS} FROM ticket_attachments WHERE id = $1");
    sqlx::query_as::<_, Attachment>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|err| {
            tracing::error!("Failed to fetch attachment {}: {:?}", id, err);
            "Failed to fetch attachment".to_string()
        })
}

/// Insert attachment rows one by one, in upload order.
#[tracing::instrument(name = "Insert attachments.", skip(conn, files))]
pub async fn insert_many(
    conn: &mut PgConnection,
    ticket_id: Uuid,
    response_id: Uuid,
    uploaded_by: Uuid,
    files: &[NewAttachment],
) -> Result<Vec<Attachment>, String> {
    let query = format!(
        r#"INSERT INTO ticket_attachments (response_id, ticket_id, file_path, file_name, file_size, file_type, uploaded_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {ATTACHMENT_COLUMNS}"#
    );
    let mut stored = Vec::with_capacity(files.len());
    for file in files {
        let attachment = sqlx::query_as::<_, Attachment>(&query)
            .bind(response_id)
            .bind(ticket_id)
            .bind(&file.file_path)
            .bind(&file.file_name)
            .bind(file.file_size)
            .bind(&file.file_type)
            .bind(uploaded_by)
            .fetch_one(&mut *conn)
            .await
            .map_err(|err| {
                tracing::error!("Failed to insert attachment {}: {:?}", file.file_name, err);
                "Failed to insert attachments".to_string()
            })?;
        stored.push(attachment);
    }
    Ok(stored)
}
