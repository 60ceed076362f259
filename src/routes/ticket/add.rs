use crate::db;
use crate::forms::ticket::CreateTicket;
use crate::helpers::JsonResponse;
use crate::models;
use crate::realtime::{ChangeKind, RealtimeHub};
use actix_web::{post, web, Responder, Result};
use serde_valid::Validate;
use sqlx::PgPool;
use std::sync::Arc;

#[tracing::instrument(name = "Add ticket.", skip(pg_pool, hub))]
#[post("")]
pub async fn add(
    user: web::ReqData<Arc<models::User>>,
    form: web::Json<CreateTicket>,
    pg_pool: web::Data<PgPool>,
    hub: web::Data<Arc<RealtimeHub>>,
) -> Result<impl Responder> {
    if let Err(errors) = form.validate() {
        return Err(JsonResponse::form_error(errors));
    }
    if form.subject.trim().is_empty() || form.message.trim().is_empty() {
        return Err(JsonResponse::bad_request("Subject and message are required"));
    }

    let email = form.email.as_deref().unwrap_or(user.email.as_str());
    let full_name = form.full_name.as_deref().or(user.full_name.as_deref());
    let new_ticket = db::ticket::NewTicket {
        organization_id: user.organization_id,
        customer_id: user.id,
        subject: form.subject.trim(),
        message: form.message.trim(),
        email: Some(email),
        full_name,
        preferred_contact_method: form.preferred_contact_method.as_deref(),
    };

    let ticket = db::ticket::insert(pg_pool.get_ref(), new_ticket)
        .await
        .map_err(JsonResponse::internal_server_error)?;
    tracing::info!("New ticket {} opened by {}", ticket.id, user.id);

    super::publish_ticket_change(&hub, &ticket, ChangeKind::Insert);
    Ok(JsonResponse::build()
        .set_id(ticket.id)
        .set_item(ticket)
        .created("Ticket created"))
}
