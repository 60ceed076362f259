use crate::configuration::Settings;
use crate::connectors::{ConnectorError, ObjectStorage};
use crate::db;
use crate::helpers::JsonResponse;
use crate::models;
use actix_web::{get, web, Responder, Result};
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct SignedUrl {
    pub url: String,
    pub expires_in: u64,
}

/// GET /api/tickets/attachments/{id}/url
#[tracing::instrument(name = "Sign attachment url.", skip(pg_pool, storage, settings))]
#[get("/attachments/{id}/url")]
pub async fn signed_url(
    user: web::ReqData<Arc<models::User>>,
    path: web::Path<(Uuid,)>,
    pg_pool: web::Data<PgPool>,
    storage: web::Data<Arc<dyn ObjectStorage>>,
    settings: web::Data<Settings>,
) -> Result<impl Responder> {
    let (id,) = path.into_inner();
    let attachment = db::attachment::fetch(pg_pool.get_ref(), id)
        .await
        .map_err(JsonResponse::internal_server_error)?
        .ok_or_else(|| JsonResponse::not_found("Attachment not found"))?;
    super::accessible_ticket(pg_pool.get_ref(), &user, attachment.ticket_id).await?;

    let expires_in = settings.storage.signed_url_ttl_secs;
    let url = storage
        .signed_url(&attachment.file_path, expires_in)
        .await
        .map_err(|err| {
            tracing::error!("Failed to sign {}: {}", attachment.file_path, err);
            ConnectorError::from(err)
        })?;

    Ok(JsonResponse::build()
        .set_item(SignedUrl { url, expires_in })
        .ok("OK"))
}
