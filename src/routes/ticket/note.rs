//! Internal notes. Admin only, never pushed over realtime channels customers can join.

use crate::db;
use crate::forms::ticket::NoteForm;
use crate::helpers::JsonResponse;
use crate::middleware::authorization;
use crate::models;
use actix_web::{delete, get, post, put, web, Responder, Result};
use serde_valid::Validate;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Note whose ticket belongs to the admin's organization, or 404.
async fn own_note(pg_pool: &PgPool, user: &models::User, id: Uuid) -> Result<models::TicketNote> {
    let note = db::note::fetch(pg_pool, id)
        .await
        .map_err(JsonResponse::internal_server_error)?
        .ok_or_else(|| JsonResponse::not_found("Note not found"))?;
    super::accessible_ticket(pg_pool, user, note.ticket_id).await?;
    Ok(note)
}

#[tracing::instrument(name = "List ticket notes.", skip(pg_pool))]
#[get("/{id}/notes")]
pub async fn list_notes(
    user: web::ReqData<Arc<models::User>>,
    path: web::Path<(Uuid,)>,
    pg_pool: web::Data<PgPool>,
) -> Result<impl Responder> {
    authorization::admin_only(&user)?;
    let (ticket_id,) = path.into_inner();
    super::accessible_ticket(pg_pool.get_ref(), &user, ticket_id).await?;

    db::note::fetch_by_ticket(pg_pool.get_ref(), ticket_id)
        .await
        .map(|notes| JsonResponse::build().set_list(notes).ok("OK"))
        .map_err(JsonResponse::internal_server_error)
}

#[tracing::instrument(name = "Add ticket note.", skip(pg_pool))]
#[post("/{id}/notes")]
pub async fn add_note(
    user: web::ReqData<Arc<models::User>>,
    path: web::Path<(Uuid,)>,
    form: web::Json<NoteForm>,
    pg_pool: web::Data<PgPool>,
) -> Result<impl Responder> {
    authorization::admin_only(&user)?;
    if let Err(errors) = form.validate() {
        return Err(JsonResponse::form_error(errors));
    }
    let (ticket_id,) = path.into_inner();
    super::accessible_ticket(pg_pool.get_ref(), &user, ticket_id).await?;

    db::note::insert(
        pg_pool.get_ref(),
        ticket_id,
        user.id,
        form.note_text.trim(),
        form.is_pinned,
    )
    .await
    .map(|note| JsonResponse::build().set_id(note.id).set_item(note).created("Note added"))
    .map_err(JsonResponse::internal_server_error)
}

#[tracing::instrument(name = "Update ticket note.", skip(pg_pool))]
#[put("/notes/{id}")]
pub async fn update_note(
    user: web::ReqData<Arc<models::User>>,
    path: web::Path<(Uuid,)>,
    form: web::Json<NoteForm>,
    pg_pool: web::Data<PgPool>,
) -> Result<impl Responder> {
    authorization::admin_only(&user)?;
    if let Err(errors) = form.validate() {
        return Err(JsonResponse::form_error(errors));
    }
    let (id,) = path.into_inner();
    own_note(pg_pool.get_ref(), &user, id).await?;

    db::note::update(pg_pool.get_ref(), id, form.note_text.trim(), form.is_pinned)
        .await
        .map_err(JsonResponse::internal_server_error)?
        .map(|note| JsonResponse::build().set_item(note).ok("Note updated"))
        .ok_or_else(|| JsonResponse::not_found("Note not found"))
}

#[tracing::instrument(name = "Toggle note pin.", skip(pg_pool))]
#[post("/notes/{id}/pin")]
pub async fn toggle_pin(
    user: web::ReqData<Arc<models::User>>,
    path: web::Path<(Uuid,)>,
    pg_pool: web::Data<PgPool>,
) -> Result<impl Responder> {
    authorization::admin_only(&user)?;
    let (id,) = path.into_inner();
    own_note(pg_pool.get_ref(), &user, id).await?;

    db::note::toggle_pin(pg_pool.get_ref(), id)
        .await
        .map_err(JsonResponse::internal_server_error)?
        .map(|note| JsonResponse::build().set_item(note).ok("OK"))
        .ok_or_else(|| JsonResponse::not_found("Note not found"))
}

#[tracing::instrument(name = "Delete ticket note.", skip(pg_pool))]
#[delete("/notes/{id}")]
pub async fn delete_note(
    user: web::ReqData<Arc<models::User>>,
    path: web::Path<(Uuid,)>,
    pg_pool: web::Data<PgPool>,
) -> Result<impl Responder> {
    authorization::admin_only(&user)?;
    let (id,) = path.into_inner();
    own_note(pg_pool.get_ref(), &user, id).await?;

    match db::note::delete(pg_pool.get_ref(), id).await {
        Ok(true) => Ok(JsonResponse::ok("Note deleted")),
        Ok(false) => Err(JsonResponse::not_found("Note not found")),
        Err(err) => Err(JsonResponse::internal_server_error(err)),
    }
}
