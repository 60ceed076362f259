use crate::db;
use crate::forms::meeting::MeetingsQuery;
use crate::helpers::JsonResponse;
use crate::models;
use crate::services::bookings;
use actix_web::{get, web, Responder, Result};
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;

/// GET /api/meetings?filter=active|inactive
/// Customers only see meetings booked for them.
#[tracing::instrument(name = "List meetings.", skip(pg_pool))]
#[get("")]
pub async fn list(
    user: web::ReqData<Arc<models::User>>,
    query: web::Query<MeetingsQuery>,
    pg_pool: web::Data<PgPool>,
) -> Result<impl Responder> {
    let customer_id = if user.is_admin() { None } else { Some(user.id) };
    let meetings = db::meeting::fetch_by_organization(pg_pool.get_ref(), user.organization_id, customer_id)
        .await
        .map_err(JsonResponse::internal_server_error)?;

    let view = bookings::view(&meetings, query.filter, Utc::now());
    Ok(JsonResponse::build().set_item(view).ok("OK"))
}
