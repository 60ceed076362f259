mod add;
mod delete;
mod get;
mod update;

pub use add::*;
pub use delete::*;
pub use get::*;
pub use update::*;

use crate::db;
use crate::helpers::JsonResponse;
use crate::models;
use sqlx::PgPool;
use uuid::Uuid;

/// Meeting of the caller's organization, or 404.
pub(crate) async fn own_meeting(
    pg_pool: &PgPool,
    user: &models::User,
    id: Uuid,
) -> Result<models::Meeting, actix_web::Error> {
    db::meeting::fetch(pg_pool, id)
        .await
        .map_err(JsonResponse::internal_server_error)?
        .filter(|meeting| meeting.organization_id == user.organization_id)
        .ok_or_else(|| JsonResponse::not_found("Meeting not found"))
}
