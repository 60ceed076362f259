use crate::helpers::JsonResponse;
use crate::models;
use actix_web::{get, web, Responder, Result};
use std::sync::Arc;

/// GET /api/me
/// The caller as resolved by the auth service. Clients need their id for upload paths.
#[tracing::instrument(name = "Get current user.")]
#[get("")]
pub async fn me(user: web::ReqData<Arc<models::User>>) -> Result<impl Responder> {
    Ok(JsonResponse::build()
        .set_item(user.into_inner().as_ref().clone())
        .ok("OK"))
}
