use crate::db;
use crate::forms::meeting::MeetingForm;
use crate::helpers::JsonResponse;
use crate::middleware::authorization;
use crate::models;
use actix_web::{put, web, Responder, Result};
use serde_valid::Validate;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

#[tracing::instrument(name = "Update meeting.", skip(pg_pool))]
#[put("/{id}")]
pub async fn update(
    user: web::ReqData<Arc<models::User>>,
    path: web::Path<(Uuid,)>,
    form: web::Json<MeetingForm>,
    pg_pool: web::Data<PgPool>,
) -> Result<impl Responder> {
    authorization::admin_only(&user)?;
    if let Err(errors) = form.validate() {
        return Err(JsonResponse::form_error(errors));
    }
    form.check_period().map_err(JsonResponse::bad_request)?;

    let (id,) = path.into_inner();
    super::own_meeting(pg_pool.get_ref(), &user, id).await?;

    let fields: db::meeting::MeetingFields = form.into_inner().into();
    db::meeting::update(pg_pool.get_ref(), id, &fields)
        .await
        .map_err(JsonResponse::internal_server_error)?
        .map(|meeting| JsonResponse::build().set_item(meeting).ok("Meeting updated"))
        .ok_or_else(|| JsonResponse::not_found("Meeting not found"))
}
