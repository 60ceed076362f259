use crate::db;
use crate::forms::meeting::MeetingForm;
use crate::helpers::JsonResponse;
use crate::middleware::authorization;
use crate::models;
use actix_web::{post, web, Responder, Result};
use serde_valid::Validate;
use sqlx::PgPool;
use std::sync::Arc;

#[tracing::instrument(name = "Add meeting.", skip(pg_pool))]
#[post("")]
pub async fn add(
    user: web::ReqData<Arc<models::User>>,
    form: web::Json<MeetingForm>,
    pg_pool: web::Data<PgPool>,
) -> Result<impl Responder> {
    authorization::admin_only(&user)?;
    if let Err(errors) = form.validate() {
        return Err(JsonResponse::form_error(errors));
    }
    form.check_period().map_err(JsonResponse::bad_request)?;

    let fields: db::meeting::MeetingFields = form.into_inner().into();
    db::meeting::insert(pg_pool.get_ref(), user.organization_id, &fields)
        .await
        .map(|meeting| {
            JsonResponse::build()
                .set_id(meeting.id)
                .set_item(meeting)
                .created("Meeting booked")
        })
        .map_err(JsonResponse::internal_server_error)
}
