use crate::connectors::storage;
use crate::db;
use crate::forms::ticket::NewResponse;
use crate::helpers::JsonResponse;
use crate::middleware::authorization;
use crate::models;
use crate::realtime::{ChangeKind, RealtimeHub, Topic};
use actix_web::{delete, post, web, Responder, Result};
use serde_valid::Validate;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// POST /api/tickets/{id}/responses
/// Files are uploaded to storage first; the body only carries their metadata.
#[tracing::instrument(name = "Add ticket response.", skip(pg_pool, hub, form))]
#[post("/{id}/responses")]
pub async fn add_response(
    user: web::ReqData<Arc<models::User>>,
    path: web::Path<(Uuid,)>,
    form: web::Json<NewResponse>,
    pg_pool: web::Data<PgPool>,
    hub: web::Data<Arc<RealtimeHub>>,
) -> Result<impl Responder> {
    let (ticket_id,) = path.into_inner();
    if let Err(errors) = form.validate() {
        return Err(JsonResponse::form_error(errors));
    }
    if form.is_empty() {
        return Err(JsonResponse::bad_request("Message or attachment is required"));
    }

    let ticket = super::accessible_ticket(pg_pool.get_ref(), &user, ticket_id).await?;

    let own_prefix = format!("{}/{}/", user.id, ticket.id);
    let mut files = Vec::with_capacity(form.attachments.len());
    for meta in &form.attachments {
        storage::validate_file(meta.size as u64, &meta.file_type)
            .map_err(JsonResponse::bad_request)?;
        if !meta.path.starts_with(&own_prefix) {
            return Err(JsonResponse::bad_request(format!(
                "Attachment {} was not uploaded for this ticket",
                meta.name
            )));
        }
        files.push(db::attachment::NewAttachment {
            file_path: meta.path.clone(),
            file_name: meta.name.clone(),
            file_size: meta.size,
            file_type: meta.file_type.clone(),
        });
    }

    let avatar_id = match form.avatar_id {
        Some(avatar_id) if user.is_admin() => {
            let known = db::avatar::belongs_to(pg_pool.get_ref(), avatar_id, ticket.organization_id)
                .await
                .map_err(JsonResponse::internal_server_error)?;
            if !known {
                return Err(JsonResponse::bad_request("Unknown avatar"));
            }
            Some(avatar_id)
        }
        _ => None,
    };

    let response = db::response::insert_with_attachments(
        pg_pool.get_ref(),
        db::response::NewResponse {
            ticket_id: ticket.id,
            user_id: user.id,
            message: form.message.trim(),
            is_admin: user.is_admin(),
            avatar_id,
        },
        &files,
    )
    .await
    .map_err(JsonResponse::internal_server_error)?;

    hub.publish_change(
        Topic::Ticket(ticket.id),
        "ticket_responses",
        ChangeKind::Insert,
        &response,
    );
    if let Ok(Some(ticket)) = db::ticket::fetch(pg_pool.get_ref(), ticket.id).await {
        hub.publish_change(
            Topic::Organization(ticket.organization_id),
            "tickets",
            ChangeKind::Update,
            &ticket,
        );
    }

    Ok(JsonResponse::build()
        .set_id(response.id)
        .set_item(response)
        .created("Response sent"))
}

#[tracing::instrument(name = "Delete ticket response.", skip(pg_pool, hub))]
#[delete("/responses/{id}")]
pub async fn delete_response(
    user: web::ReqData<Arc<models::User>>,
    path: web::Path<(Uuid,)>,
    pg_pool: web::Data<PgPool>,
    hub: web::Data<Arc<RealtimeHub>>,
) -> Result<impl Responder> {
    authorization::admin_only(&user)?;
    let (id,) = path.into_inner();

    let response = db::response::fetch(pg_pool.get_ref(), id)
        .await
        .map_err(JsonResponse::internal_server_error)?
        .ok_or_else(|| JsonResponse::not_found("Response not found"))?;
    super::accessible_ticket(pg_pool.get_ref(), &user, response.ticket_id).await?;

    let deleted = db::response::delete(pg_pool.get_ref(), id)
        .await
        .map_err(JsonResponse::internal_server_error)?
        .ok_or_else(|| JsonResponse::not_found("Response not found"))?;

    hub.publish_change(
        Topic::Ticket(deleted.ticket_id),
        "ticket_responses",
        ChangeKind::Delete,
        &deleted,
    );
    Ok(JsonResponse::ok("Response deleted"))
}
