use crate::db;
use crate::forms::ticket::{AssignTicket, MarkRead, UpdatePriority, UpdateStatus};
use crate::helpers::JsonResponse;
use crate::middleware::authorization;
use crate::models;
use crate::realtime::{ChangeKind, RealtimeHub, Topic};
use actix_web::{patch, post, web, Responder, Result};
use sqlx::PgPool;
use std::sync::Arc;

fn updated(
    result: Result<Option<models::Ticket>, String>,
    hub: &RealtimeHub,
) -> Result<actix_web::HttpResponse> {
    let ticket = result
        .map_err(JsonResponse::internal_server_error)?
        .ok_or_else(|| JsonResponse::not_found("Ticket not found"))?;
    super::publish_ticket_change(hub, &ticket, ChangeKind::Update);
    Ok(JsonResponse::build().set_item(ticket).ok("Ticket updated"))
}

/// PATCH /api/tickets/status
/// Any status may follow any other. Customers may change the status of their own tickets.
#[tracing::instrument(name = "Update ticket status.", skip(pg_pool, hub))]
#[patch("/status")]
pub async fn status(
    user: web::ReqData<Arc<models::User>>,
    form: web::Json<UpdateStatus>,
    pg_pool: web::Data<PgPool>,
    hub: web::Data<Arc<RealtimeHub>>,
) -> Result<impl Responder> {
    super::accessible_ticket(pg_pool.get_ref(), &user, form.ticket_id).await?;
    updated(
        db::ticket::update_status(pg_pool.get_ref(), form.ticket_id, form.status).await,
        &hub,
    )
}

/// PATCH /api/tickets/assign
#[tracing::instrument(name = "Assign ticket.", skip(pg_pool, hub))]
#[patch("/assign")]
pub async fn assign(
    user: web::ReqData<Arc<models::User>>,
    form: web::Json<AssignTicket>,
    pg_pool: web::Data<PgPool>,
    hub: web::Data<Arc<RealtimeHub>>,
) -> Result<impl Responder> {
    authorization::admin_only(&user)?;
    super::accessible_ticket(pg_pool.get_ref(), &user, form.ticket_id).await?;
    if let Some(assignee) = form.assigned_to {
        let known = db::profile::is_admin_of(pg_pool.get_ref(), assignee, user.organization_id)
            .await
            .map_err(JsonResponse::internal_server_error)?;
        if !known {
            return Err(JsonResponse::bad_request("Tickets can only be assigned to admins"));
        }
    }
    updated(
        db::ticket::assign(pg_pool.get_ref(), form.ticket_id, form.assigned_to).await,
        &hub,
    )
}

/// PATCH /api/tickets/priority
#[tracing::instrument(name = "Update ticket priority.", skip(pg_pool, hub))]
#[patch("/priority")]
pub async fn priority(
    user: web::ReqData<Arc<models::User>>,
    form: web::Json<UpdatePriority>,
    pg_pool: web::Data<PgPool>,
    hub: web::Data<Arc<RealtimeHub>>,
) -> Result<impl Responder> {
    authorization::admin_only(&user)?;
    super::accessible_ticket(pg_pool.get_ref(), &user, form.ticket_id).await?;
    updated(
        db::ticket::update_priority(pg_pool.get_ref(), form.ticket_id, form.priority).await,
        &hub,
    )
}

/// POST /api/tickets/mark-read
/// Marks the other side's responses as read. Calling it again changes nothing.
#[tracing::instrument(name = "Mark ticket messages read.", skip(pg_pool, hub))]
#[post("/mark-read")]
pub async fn mark_read(
    user: web::ReqData<Arc<models::User>>,
    form: web::Json<MarkRead>,
    pg_pool: web::Data<PgPool>,
    hub: web::Data<Arc<RealtimeHub>>,
) -> Result<impl Responder> {
    super::accessible_ticket(pg_pool.get_ref(), &user, form.ticket_id).await?;
    let changed = db::response::mark_read(pg_pool.get_ref(), form.ticket_id, user.is_admin())
        .await
        .map_err(JsonResponse::internal_server_error)?;

    for response in &changed {
        hub.publish_change(
            Topic::Ticket(form.ticket_id),
            "ticket_responses",
            ChangeKind::Update,
            response,
        );
    }
    Ok(JsonResponse::build()
        .set_list(changed)
        .ok("Messages marked as read"))
}
