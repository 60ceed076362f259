use crate::db;
use crate::db::ticket::Scope;
use crate::forms::ticket::ListQuery;
use crate::helpers::JsonResponse;
use crate::middleware::authorization;
use crate::models;
use actix_web::{get, web, Responder, Result};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// GET /api/tickets?status=open&offset=0&limit=20
/// One page of one status bucket. Customers only get their own tickets.
#[tracing::instrument(name = "List tickets.", skip(pg_pool))]
#[get("")]
pub async fn list(
    user: web::ReqData<Arc<models::User>>,
    query: web::Query<ListQuery>,
    pg_pool: web::Data<PgPool>,
) -> Result<impl Responder> {
    let status = query.status().map_err(JsonResponse::bad_request)?;
    let scope = Scope {
        organization_id: user.organization_id,
        customer_id: if user.is_admin() { None } else { Some(user.id) },
    };

    let mut tickets =
        db::ticket::fetch_page(pg_pool.get_ref(), scope, status, query.offset(), query.limit())
            .await
            .map_err(JsonResponse::internal_server_error)?;
    super::with_note_summaries(pg_pool.get_ref(), &user, &mut tickets).await?;

    Ok(JsonResponse::build().set_list(tickets).ok("OK"))
}

#[tracing::instrument(name = "Get ticket.", skip(pg_pool))]
#[get("/{id}")]
pub async fn item(
    user: web::ReqData<Arc<models::User>>,
    path: web::Path<(Uuid,)>,
    pg_pool: web::Data<PgPool>,
) -> Result<impl Responder> {
    let (id,) = path.into_inner();
    let ticket = super::accessible_ticket(pg_pool.get_ref(), &user, id).await?;
    let mut tickets = [ticket];
    super::with_note_summaries(pg_pool.get_ref(), &user, &mut tickets).await?;
    let [ticket] = tickets;

    Ok(JsonResponse::build().set_item(ticket).ok("OK"))
}

/// GET /api/tickets/tags
#[tracing::instrument(name = "List ticket tags.", skip(pg_pool))]
#[get("/tags")]
pub async fn tags(
    user: web::ReqData<Arc<models::User>>,
    pg_pool: web::Data<PgPool>,
) -> Result<impl Responder> {
    db::ticket::fetch_tags(pg_pool.get_ref(), user.organization_id)
        .await
        .map(|tags| JsonResponse::build().set_list(tags).ok("OK"))
        .map_err(JsonResponse::internal_server_error)
}

/// GET /api/tickets/avatars
/// Personas admins can sign responses with.
#[tracing::instrument(name = "List avatars.", skip(pg_pool))]
#[get("/avatars")]
pub async fn avatars(
    user: web::ReqData<Arc<models::User>>,
    pg_pool: web::Data<PgPool>,
) -> Result<impl Responder> {
    db::avatar::fetch_by_organization(pg_pool.get_ref(), user.organization_id)
        .await
        .map(|avatars| JsonResponse::build().set_list(avatars).ok("OK"))
        .map_err(JsonResponse::internal_server_error)
}

/// GET /api/tickets/admins
/// Agents a ticket can be assigned to.
#[tracing::instrument(name = "List admins.", skip(pg_pool))]
#[get("/admins")]
pub async fn admins(
    user: web::ReqData<Arc<models::User>>,
    pg_pool: web::Data<PgPool>,
) -> Result<impl Responder> {
    authorization::admin_only(&user)?;
    db::profile::fetch_admins(pg_pool.get_ref(), user.organization_id)
        .await
        .map(|admins| JsonResponse::build().set_list(admins).ok("OK"))
        .map_err(JsonResponse::internal_server_error)
}

/// GET /api/tickets/predefined-responses
#[tracing::instrument(name = "List predefined responses.", skip(pg_pool))]
#[get("/predefined-responses")]
pub async fn predefined_responses(
    user: web::ReqData<Arc<models::User>>,
    pg_pool: web::Data<PgPool>,
) -> Result<impl Responder> {
    authorization::admin_only(&user)?;
    db::profile::fetch_predefined_responses(pg_pool.get_ref(), user.organization_id)
        .await
        .map(|responses| JsonResponse::build().set_list(responses).ok("OK"))
        .map_err(JsonResponse::internal_server_error)
}
