use crate::db;
use crate::helpers::JsonResponse;
use crate::middleware::authorization;
use crate::models;
use actix_web::{delete, web, Responder, Result};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

#[tracing::instrument(name = "Delete meeting.", skip(pg_pool))]
#[delete("/{id}")]
pub async fn delete(
    user: web::ReqData<Arc<models::User>>,
    path: web::Path<(Uuid,)>,
    pg_pool: web::Data<PgPool>,
) -> Result<impl Responder> {
    authorization::admin_only(&user)?;
    let (id,) = path.into_inner();
    super::own_meeting(pg_pool.get_ref(), &user, id).await?;

    match db::meeting::delete(pg_pool.get_ref(), id).await {
        Ok(true) => Ok(JsonResponse::ok("Meeting deleted")),
        Ok(false) => Err(JsonResponse::not_found("Meeting not found")),
        Err(err) => Err(JsonResponse::internal_server_error(err)),
    }
}
