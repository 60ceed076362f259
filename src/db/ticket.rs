use crate::db;
use crate::models::{Ticket, TicketPriority, TicketStatus, TicketTag};
use sqlx::{PgConnection, PgPool};
use std::collections::HashMap;
use tracing::Instrument;
use uuid::Uuid;

const TICKET_COLUMNS: &str = r#"id, organization_id, customer_id, subject, message, status, priority,
    email, full_name, preferred_contact_method, assigned_to, created_at, updated_at"#;

/// Who is looking at the ticket list: an admin sees the whole organization,
/// a customer only their own tickets.
#[derive(Debug, Clone, Copy)]
pub struct Scope {
    pub organization_id: Uuid,
    pub customer_id: Option<Uuid>,
}

#[tracing::instrument(name = "Fetch tickets page.", skip(pool))]
pub async fn fetch_page(
    pool: &PgPool,
    scope: Scope,
    status: TicketStatus,
    offset: i64,
    limit: i64,
) -> Result<Vec<Ticket>, String> {
    let query = format!(
        r#"SELECT {TICKET_COLUMNS} FROM tickets
        WHERE organization_id = $1 AND status = $2 AND ($3::uuid IS NULL OR customer_id = $3)
        ORDER BY created_at DESC
        OFFSET $4 LIMIT $5"#
    );
    let query_span = tracing::info_span!("Select tickets by status.");
    let mut tickets = sqlx::query_as::<_, Ticket>(&query)
        .bind(scope.organization_id)
        .bind(status)
        .bind(scope.customer_id)
        .bind(offset)
        .bind(limit)
        .fetch_all(pool)
        .instrument(query_span)
        .await
        .map_err(|err| {
            tracing::error!("Failed to fetch tickets: {:?}", err);
            "Failed to fetch tickets".to_string()
        })?;

    hydrate(pool, &mut tickets).await?;
    Ok(tickets)
}

#[tracing::instrument(name = "Fetch ticket by id.", skip(pool))]
pub async fn fetch(pool: &PgPool, id: Uuid) -> Result<Option<Ticket>, String> {
    let query = format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE id = $1");
    let ticket = sqlx::query_as::<_, Ticket>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|err| {
            tracing::error!("Failed to fetch ticket: {:?}", err);
            "Failed to fetch ticket".to_string()
        })?;

    match ticket {
        Some(ticket) => {
            let mut tickets = vec![ticket];
            hydrate(pool, &mut tickets).await?;
            Ok(tickets.pop())
        }
        None => Ok(None),
    }
}

/// Organization and customer of a ticket, without loading the conversation.
pub async fn fetch_owner(pool: &PgPool, id: Uuid) -> Result<Option<(Uuid, Uuid)>, String> {
    sqlx::query_as::<_, (Uuid, Uuid)>(
        "SELECT organization_id, customer_id FROM tickets WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|err| {
        tracing::error!("Failed to fetch ticket owner: {:?}", err);
        "Failed to fetch ticket".to_string()
    })
}

/// Attach responses (with attachments) and tags to a page of tickets.
async fn hydrate(pool: &PgPool, tickets: &mut [Ticket]) -> Result<(), String> {
    if tickets.is_empty() {
        return Ok(());
    }
    let ids: Vec<Uuid> = tickets.iter().map(|t| t.id).collect();

    let mut responses = db::response::fetch_by_tickets(pool, &ids).await?;
    let response_ids: Vec<Uuid> = responses.iter().map(|r| r.id).collect();
    let mut attachments = db::attachment::fetch_by_responses(pool, &response_ids).await?;
    for response in responses.iter_mut() {
        if let Some(list) = attachments.remove(&response.id) {
            response.attachments = list;
        }
    }

    let mut by_ticket: HashMap<Uuid, Vec<_>> = HashMap::new();
    for response in responses {
        by_ticket.entry(response.ticket_id).or_default().push(response);
    }

    let mut tags = fetch_tags_by_tickets(pool, &ids).await?;
    for ticket in tickets.iter_mut() {
        ticket.ticket_responses = by_ticket.remove(&ticket.id).unwrap_or_default();
        ticket.tags = tags.remove(&ticket.id).unwrap_or_default();
    }
    Ok(())
}

async fn fetch_tags_by_tickets(
    pool: &PgPool,
    ticket_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<TicketTag>>, String> {
    let rows = sqlx::query_as::<_, (Uuid, Uuid, Uuid, String, Option<String>)>(
        r#"SELECT a.ticket_id, t.id, t.organization_id, t.name, t.color
        FROM ticket_tag_assignments a
        JOIN ticket_tags t ON t.id = a.tag_id
        WHERE a.ticket_id = ANY($1)
        ORDER BY t.name"#,
    )
    .bind(ticket_ids)
    .fetch_all(pool)
    .await
    .map_err(|err| {
        tracing::error!("Failed to fetch ticket tags: {:?}", err);
        "Failed to fetch ticket tags".to_string()
    })?;

    let mut tags: HashMap<Uuid, Vec<TicketTag>> = HashMap::new();
    for (ticket_id, id, organization_id, name, color) in rows {
        tags.entry(ticket_id).or_default().push(TicketTag {
            id,
            organization_id,
            name,
            color,
        });
    }
    Ok(tags)
}

pub struct NewTicket<'a> {
    pub organization_id: Uuid,
    pub customer_id: Uuid,
    pub subject: &'a str,
    pub message: &'a str,
    pub email: Option<&'a str>,
    pub full_name: Option<&'a str>,
    pub preferred_contact_method: Option<&'a str>,
}

#[tracing::instrument(name = "Insert ticket.", skip(pool, ticket))]
pub async fn insert(pool: &PgPool, ticket: NewTicket<'_>) -> Result<Ticket, String> {
    let query = format!(
        r#"INSERT INTO tickets (organization_id, customer_id, subject, message, status,
            email, full_name, preferred_contact_method)
        VALUES ($1, $2, $3, $4, 'open', $5, $6, $7)
        RETURNING {TICKET_COLUMNS}"#
    );
    let query_span = tracing::info_span!("Saving new ticket into the database");
    sqlx::query_as::<_, Ticket>(&query)
        .bind(ticket.organization_id)
        .bind(ticket.customer_id)
        .bind(ticket.subject)
        .bind(ticket.message)
        .bind(ticket.email)
        .bind(ticket.full_name)
        .bind(ticket.preferred_contact_method)
        .fetch_one(pool)
        .instrument(query_span)
        .await
        .map_err(|err| {
            tracing::error!("Failed to insert ticket: {:?}", err);
            "Failed to insert ticket".to_string()
        })
}

fn update_query(set_clause: &str) -> String {
    format!(
        "UPDATE tickets SET {set_clause}, updated_at = NOW() WHERE id = $1 RETURNING {TICKET_COLUMNS}"
    )
}

fn update_failed(id: Uuid, err: sqlx::Error) -> String {
    tracing::error!("Failed to update ticket {}: {:?}", id, err);
    "Failed to update ticket".to_string()
}

#[tracing::instrument(name = "Update ticket status.", skip(pool))]
pub async fn update_status(
    pool: &PgPool,
    id: Uuid,
    status: TicketStatus,
) -> Result<Option<Ticket>, String> {
    sqlx::query_as::<_, Ticket>(&update_query("status = $2"))
        .bind(id)
        .bind(status)
        .fetch_optional(pool)
        .await
        .map_err(|err| update_failed(id, err))
}

#[tracing::instrument(name = "Assign ticket.", skip(pool))]
pub async fn assign(
    pool: &PgPool,
    id: Uuid,
    assigned_to: Option<Uuid>,
) -> Result<Option<Ticket>, String> {
    sqlx::query_as::<_, Ticket>(&update_query("assigned_to = $2"))
        .bind(id)
        .bind(assigned_to)
        .fetch_optional(pool)
        .await
        .map_err(|err| update_failed(id, err))
}

#[tracing::instrument(name = "Update ticket priority.", skip(pool))]
pub async fn update_priority(
    pool: &PgPool,
    id: Uuid,
    priority: Option<TicketPriority>,
) -> Result<Option<Ticket>, String> {
    sqlx::query_as::<_, Ticket>(&update_query("priority = $2"))
        .bind(id)
        .bind(priority)
        .fetch_optional(pool)
        .await
        .map_err(|err| update_failed(id, err))
}

/// Bump `updated_at` after a new response lands.
pub async fn touch(conn: &mut PgConnection, id: Uuid) -> Result<(), String> {
    sqlx::query("UPDATE tickets SET updated_at = NOW() WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await
        .map(|_| ())
        .map_err(|err| {
            tracing::error!("Failed to touch ticket {}: {:?}", id, err);
            "Failed to update ticket".to_string()
        })
}

#[tracing::instrument(name = "Assign tag to ticket.", skip(pool))]
pub async fn add_tag(pool: &PgPool, ticket_id: Uuid, tag_id: Uuid) -> Result<(), String> {
    sqlx::query(
        "INSERT INTO ticket_tag_assignments (ticket_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(ticket_id)
    .bind(tag_id)
    .execute(pool)
    .await
    .map(|_| ())
    .map_err(|err| {
        tracing::error!("Failed to add tag: {:?}", err);
        "Failed to add tag".to_string()
    })
}

#[tracing::instrument(name = "Remove tag from ticket.", skip(pool))]
pub async fn remove_tag(pool: &PgPool, ticket_id: Uuid, tag_id: Uuid) -> Result<bool, String> {
    sqlx::query("DELETE FROM ticket_tag_assignments WHERE ticket_id = $1 AND tag_id = $2")
        .bind(ticket_id)
        .bind(tag_id)
        .execute(pool)
        .await
        .map(|result| result.rows_affected() > 0)
        .map_err(|err| {
            tracing::error!("Failed to remove tag: {:?}", err);
            "Failed to remove tag".to_string()
        })
}

#[tracing::instrument(name = "Fetch organization tags.", skip(pool))]
pub async fn fetch_tags(pool: &PgPool, organization_id: Uuid) -> Result<Vec<TicketTag>, String> {
    sqlx::query_as::<_, TicketTag>(
        "SELECT id, organization_id, name, color FROM ticket_tags WHERE organization_id = $1 ORDER BY name",
    )
    .bind(organization_id)
    .fetch_all(pool)
    .await
    .map_err(|err| {
        tracing::error!("Failed to fetch tags: {:?}", err);
        "Failed to fetch tags".to_string()
    })
}
