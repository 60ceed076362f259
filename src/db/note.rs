use crate::models::{NoteSummary, TicketNote};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

const NOTE_COLUMNS: &str = "id, ticket_id, admin_id, note_text, is_pinned, created_at, updated_at";

/// Pinned notes first, then newest.
#[tracing::instrument(name = "Fetch internal notes.", skip(pool))]
pub async fn fetch_by_ticket(pool: &PgPool, ticket_id: Uuid) -> Result<Vec<TicketNote>, String> {
    let query = format!(
        "SELECT {NOTE_COLUMNS} FROM ticket_notes WHERE ticket_id = $1 ORDER BY is_pinned DESC, created_at DESC"
    );
    sqlx::query_as::<_, TicketNote>(&query)
        .bind(ticket_id)
        .fetch_all(pool)
        .await
        .map_err(|err| {
            tracing::error!("Failed to fetch notes: {:?}", err);
            "Failed to fetch notes".to_string()
        })
}

/// Note count and pinned flag per ticket; tickets without notes are absent.
pub async fn summaries(
    pool: &PgPool,
    ticket_ids: &[Uuid],
) -> Result<HashMap<Uuid, NoteSummary>, String> {
    if ticket_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = sqlx::query_as::<_, (Uuid, i64, bool)>(
        r#"SELECT ticket_id, COUNT(*), BOOL_OR(is_pinned)
        FROM ticket_notes WHERE ticket_id = ANY($1)
        GROUP BY ticket_id"#,
    )
    .bind(ticket_ids)
    .fetch_all(pool)
    .await
    .map_err(|err| {
        tracing::error!("Failed to count notes: {:?}", err);
        "Failed to fetch notes".to_string()
    })?;

    Ok(rows
        .into_iter()
        .map(|(ticket_id, count, pinned)| (ticket_id, NoteSummary { count, pinned }))
        .collect())
}

pub async fn fetch(pool: &PgPool, id: Uuid) -> Result<Option<TicketNote>, String> {
    let query = format!("SELECT {NOTE_COLUMNS} FROM ticket_notes WHERE id = $1");
    sqlx::query_as::<_, TicketNote>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|err| {
            tracing::error!("Failed to fetch note {}: {:?}", id, err);
            "Failed to fetch note".to_string()
        })
}

#[tracing::instrument(name = "Insert internal note.", skip(pool, note_text))]
pub async fn insert(
    pool: &PgPool,
    ticket_id: Uuid,
    admin_id: Uuid,
    note_text: &str,
    is_pinned: bool,
) -> Result<TicketNote, String> {
    let query = format!(
        r#"INSERT INTO ticket_notes (ticket_id, admin_id, note_text, is_pinned)
        VALUES ($1, $2, $3, $4)
        RETURNING {NOTE_COLUMNS}"#
    );
    sqlx::query_as::<_, TicketNote>(&query)
        .bind(ticket_id)
        .bind(admin_id)
        .bind(note_text)
        .bind(is_pinned)
        .fetch_one(pool)
        .await
        .map_err(|err| {
            tracing::error!("Failed to insert note: {:?}", err);
            "Failed to save note".to_string()
        })
}

#[tracing::instrument(name = "Update internal note.", skip(pool, note_text))]
pub async fn update(
    pool: &PgPool,
    id: Uuid,
    note_text: &str,
    is_pinned: bool,
) -> Result<Option<TicketNote>, String> {
    let query = format!(
        r#"UPDATE ticket_notes SET note_text = $2, is_pinned = $3, updated_at = NOW()
        WHERE id = $1
        RETURNING {NOTE_COLUMNS}"#
    );
    sqlx::query_as::<_, TicketNote>(&query)
        .bind(id)
        .bind(note_text)
        .bind(is_pinned)
        .fetch_optional(pool)
        .await
        .map_err(|err| {
            tracing::error!("Failed to update note {}: {:?}", id, err);
            "Failed to save note".to_string()
        })
}

#[tracing::instrument(name = "Toggle note pin.", skip(pool))]
pub async fn toggle_pin(pool: &PgPool, id: Uuid) -> Result<Option<TicketNote>, String> {
    let query = format!(
        r#"UPDATE ticket_notes SET is_pinned = NOT is_pinned, updated_at = NOW()
        WHERE id = $1
        RETURNING {NOTE_COLUMNS}"#
    );
    sqlx::query_as::<_, TicketNote>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|err| {
            tracing::error!("Failed to toggle note pin {}: {:?}", id, err);
            "Failed to toggle note pin".to_string()
        })
}

#[tracing::instrument(name = "Delete internal note.", skip(pool))]
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, String> {
    sqlx::query("DELETE FROM ticket_notes WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map(|result| result.rows_affected() > 0)
        .map_err(|err| {
            tracing::error!("Failed to delete note {}: {:?}", id, err);
            "Failed to delete note".to_string()
        })
}
