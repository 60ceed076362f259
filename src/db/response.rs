use crate::db;
use crate::db::attachment::NewAttachment;
use crate::models::TicketResponse;
use sqlx::{PgConnection, PgPool};
use tracing::Instrument;
use uuid::Uuid;

const RESPONSE_COLUMNS: &str =
    "id, ticket_id, user_id, message, is_admin, avatar_id, is_read, read_at, created_at";

/// Responses for a set of tickets, oldest first.
pub async fn fetch_by_tickets(
    pool: &PgPool,
    ticket_ids: &[Uuid],
) -> Result<Vec<TicketResponse>, String> {
    let query = format!(
        "SELECT {RESPONSE_COLUMNS} FROM ticket_responses WHERE ticket_id = ANY($1) ORDER BY created_at, id"
    );
    let query_span = tracing::info_span!("Select ticket responses.");
    sqlx::query_as::<_, TicketResponse>(&query)
        .bind(ticket_ids)
        .fetch_all(pool)
        .instrument(query_span)
        .await
        .map_err(|err| {
            tracing::error!("Failed to fetch responses: {:?}", err);
            "Failed to fetch responses".to_string()
        })
}

pub async fn fetch(pool: &PgPool, id: Uuid) -> Result<Option<TicketResponse>, String> {
    let query = format!("SELECT {RESPONSE_COLUMNS} FROM ticket_responses WHERE id = $1");
    sqlx::query_as::<_, TicketResponse>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|err| {
            tracing::error!("Failed to fetch response {}: {:?}", id, err);
            "Failed to fetch response".to_string()
        })
}

pub struct NewResponse<'a> {
    pub ticket_id: Uuid,
    pub user_id: Uuid,
    pub message: &'a str,
    pub is_admin: bool,
    pub avatar_id: Option<Uuid>,
}

/// New responses start unread for the other side.
#[tracing::instrument(name = "Insert ticket response.", skip(conn, response))]
pub async fn insert(
    conn: &mut PgConnection,
    response: NewResponse<'_>,
) -> Result<TicketResponse, String> {
    let query = format!(
        r#"INSERT INTO ticket_responses (ticket_id, user_id, message, is_admin, avatar_id, is_read)
        VALUES ($1, $2, $3, $4, $5, FALSE)
        RETURNING {RESPONSE_COLUMNS}"#
    );
    let query_span = tracing::info_span!("Saving new response into the database");
    sqlx::query_as::<_, TicketResponse>(&query)
        .bind(response.ticket_id)
        .bind(response.user_id)
        .bind(response.message)
        .bind(response.is_admin)
        .bind(response.avatar_id)
        .fetch_one(conn)
        .instrument(query_span)
        .await
        .map_err(|err| {
            tracing::error!("Failed to insert response: {:?}", err);
            "Failed to insert response".to_string()
        })
}

/// Response row, its attachment rows and the ticket's `updated_at` bump,
/// committed together or not at all.
pub async fn insert_with_attachments(
    pool: &PgPool,
    response: NewResponse<'_>,
    files: &[NewAttachment],
) -> Result<TicketResponse, String> {
    let mut tx = pool.begin().await.map_err(|err| {
        tracing::error!("Failed to begin transaction: {:?}", err);
        "Failed to insert response".to_string()
    })?;

    let ticket_id = response.ticket_id;
    let uploaded_by = response.user_id;
    let mut stored = insert(&mut tx, response).await?;
    if !files.is_empty() {
        stored.attachments =
            db::attachment::insert_many(&mut tx, ticket_id, stored.id, uploaded_by, files).await?;
    }
    db::ticket::touch(&mut tx, ticket_id).await?;

    tx.commit().await.map_err(|err| {
        tracing::error!("Failed to commit response: {:?}", err);
        "Failed to insert response".to_string()
    })?;
    Ok(stored)
}

/// Flip `is_read` on the counterparty's unread responses and return the rows that changed.
/// A second call finds nothing left to update.
#[tracing::instrument(name = "Mark responses as read.", skip(pool))]
pub async fn mark_read(
    pool: &PgPool,
    ticket_id: Uuid,
    reader_is_admin: bool,
) -> Result<Vec<TicketResponse>, String> {
    let query = format!(
        r#"UPDATE ticket_responses SET is_read = TRUE, read_at = NOW()
        WHERE ticket_id = $1 AND is_admin = $2 AND is_read = FALSE
        RETURNING {RESPONSE_COLUMNS}"#
    );
    sqlx::query_as::<_, TicketResponse>(&query)
        .bind(ticket_id)
        .bind(!reader_is_admin)
        .fetch_all(pool)
        .await
        .map_err(|err| {
            tracing::error!("Failed to mark responses read: {:?}", err);
            "Failed to mark messages as read".to_string()
        })
}

#[tracing::instrument(name = "Delete ticket response.", skip(pool))]
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<Option<TicketResponse>, String> {
    let query = format!("DELETE FROM ticket_responses WHERE id = $1 RETURNING {RESPONSE_COLUMNS}");
    sqlx::query_as::<_, TicketResponse>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|err| {
            tracing::error!("Failed to delete response {}: {:?}", id, err);
            "Failed to delete response".to_string()
        })
}
