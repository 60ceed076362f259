use crate::db;
use crate::helpers::JsonResponse;
use crate::middleware::authorization;
use crate::models;
use crate::realtime::{ChangeKind, RealtimeHub};
use actix_web::{delete, post, web, Responder, Result};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

async fn republish(pg_pool: &PgPool, hub: &RealtimeHub, ticket_id: Uuid) -> Result<models::Ticket> {
    let ticket = db::ticket::fetch(pg_pool, ticket_id)
        .await
        .map_err(JsonResponse::internal_server_error)?
        .ok_or_else(|| JsonResponse::not_found("Ticket not found"))?;
    super::publish_ticket_change(hub, &ticket, ChangeKind::Update);
    Ok(ticket)
}

#[tracing::instrument(name = "Tag ticket.", skip(pg_pool, hub))]
#[post("/{id}/tags/{tag_id}")]
pub async fn add_tag(
    user: web::ReqData<Arc<models::User>>,
    path: web::Path<(Uuid, Uuid)>,
    pg_pool: web::Data<PgPool>,
    hub: web::Data<Arc<RealtimeHub>>,
) -> Result<impl Responder> {
    authorization::admin_only(&user)?;
    let (ticket_id, tag_id) = path.into_inner();
    super::accessible_ticket(pg_pool.get_ref(), &user, ticket_id).await?;

    let tags = db::ticket::fetch_tags(pg_pool.get_ref(), user.organization_id)
        .await
        .map_err(JsonResponse::internal_server_error)?;
    if !tags.iter().any(|tag| tag.id == tag_id) {
        return Err(JsonResponse::not_found("Tag not found"));
    }

    db::ticket::add_tag(pg_pool.get_ref(), ticket_id, tag_id)
        .await
        .map_err(JsonResponse::internal_server_error)?;
    let ticket = republish(pg_pool.get_ref(), &hub, ticket_id).await?;
    Ok(JsonResponse::build().set_item(ticket).ok("Tag added"))
}

#[tracing::instrument(name = "Untag ticket.", skip(pg_pool, hub))]
#[delete("/{id}/tags/{tag_id}")]
pub async fn remove_tag(
    user: web::ReqData<Arc<models::User>>,
    path: web::Path<(Uuid, Uuid)>,
    pg_pool: web::Data<PgPool>,
    hub: web::Data<Arc<RealtimeHub>>,
) -> Result<impl Responder> {
    authorization::admin_only(&user)?;
    let (ticket_id, tag_id) = path.into_inner();
    super::accessible_ticket(pg_pool.get_ref(), &user, ticket_id).await?;

    let removed = db::ticket::remove_tag(pg_pool.get_ref(), ticket_id, tag_id)
        .await
        .map_err(JsonResponse::internal_server_error)?;
    if !removed {
        return Err(JsonResponse::not_found("Tag is not assigned to this ticket"));
    }
    let ticket = republish(pg_pool.get_ref(), &hub, ticket_id).await?;
    Ok(JsonResponse::build().set_item(ticket).ok("Tag removed"))
}
