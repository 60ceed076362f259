mod add;
mod attachment;
mod get;
mod note;
mod response;
mod tag;
mod update;

pub use add::*;
pub use attachment::*;
pub use get::*;
pub use note::*;
pub use response::*;
pub use tag::*;
pub use update::*;

use crate::db;
use crate::helpers::JsonResponse;
use crate::middleware::authorization;
use crate::models::{Ticket, User};
use crate::realtime::{ChangeKind, RealtimeHub, Topic};
use sqlx::PgPool;
use uuid::Uuid;

/// Ticket the caller may see, or 404.
pub(crate) async fn accessible_ticket(
    pg_pool: &PgPool,
    user: &User,
    ticket_id: Uuid,
) -> Result<Ticket, actix_web::Error> {
    let ticket = db::ticket::fetch(pg_pool, ticket_id)
        .await
        .map_err(JsonResponse::internal_server_error)?
        .ok_or_else(|| JsonResponse::not_found("Ticket not found"))?;
    authorization::ticket_access(user, &ticket)?;
    Ok(ticket)
}

/// Admin views show how many internal notes each ticket carries.
pub(crate) async fn with_note_summaries(
    pg_pool: &PgPool,
    user: &User,
    tickets: &mut [Ticket],
) -> Result<(), actix_web::Error> {
    if !user.is_admin() {
        return Ok(());
    }
    let ids: Vec<Uuid> = tickets.iter().map(|t| t.id).collect();
    let summaries = db::note::summaries(pg_pool, &ids)
        .await
        .map_err(JsonResponse::internal_server_error)?;
    for ticket in tickets.iter_mut() {
        ticket.notes = Some(summaries.get(&ticket.id).copied().unwrap_or_default());
    }
    Ok(())
}

/// Tell list views and the open conversation that the ticket row changed.
pub(crate) fn publish_ticket_change(hub: &RealtimeHub, ticket: &Ticket, kind: ChangeKind) {
    hub.publish_change(Topic::Organization(ticket.organization_id), "tickets", kind, ticket);
    hub.publish_change(Topic::Ticket(ticket.id), "tickets", kind, ticket);
}
