use crate::db;
use crate::forms::study_plan::{PlannedDatesForm, PreferenceForm};
use crate::helpers::JsonResponse;
use crate::models;
use actix_web::{put, web, Responder, Result};
use serde_valid::Validate;
use sqlx::PgPool;
use std::collections::HashSet;
use std::sync::Arc;

#[tracing::instrument(name = "Save study plan preference.", skip(pg_pool))]
#[put("/{course_id}/preference")]
pub async fn preference(
    user: web::ReqData<Arc<models::User>>,
    path: web::Path<(i32,)>,
    form: web::Json<PreferenceForm>,
    pg_pool: web::Data<PgPool>,
) -> Result<impl Responder> {
    let (course_id,) = path.into_inner();
    db::study_plan::upsert_preference(pg_pool.get_ref(), user.id, course_id, form.style)
        .await
        .map(|preference| JsonResponse::build().set_item(preference).ok("Preference saved"))
        .map_err(JsonResponse::internal_server_error)
}

/// PUT /api/study-plan/{course_id}/dates
/// Only lessons of this course are accepted.
#[tracing::instrument(name = "Save planned dates.", skip(pg_pool, form))]
#[put("/{course_id}/dates")]
pub async fn dates(
    user: web::ReqData<Arc<models::User>>,
    path: web::Path<(i32,)>,
    form: web::Json<PlannedDatesForm>,
    pg_pool: web::Data<PgPool>,
) -> Result<impl Responder> {
    if let Err(errors) = form.validate() {
        return Err(JsonResponse::form_error(errors));
    }
    let (course_id,) = path.into_inner();
    let pool = pg_pool.get_ref();

    let topics = db::study_plan::fetch_topics(pool, course_id)
        .await
        .map_err(JsonResponse::internal_server_error)?;
    let topic_ids: Vec<i32> = topics.iter().map(|topic| topic.id).collect();
    let lessons: HashSet<i32> = db::study_plan::fetch_lessons(pool, &topic_ids)
        .await
        .map_err(JsonResponse::internal_server_error)?
        .into_iter()
        .map(|lesson| lesson.id)
        .collect();

    if let Some(unknown) = form.dates.iter().find(|d| !lessons.contains(&d.lesson_id)) {
        return Err(JsonResponse::bad_request(format!(
            "Lesson {} is not part of course {}",
            unknown.lesson_id, course_id
        )));
    }

    let planned: Vec<_> = form
        .dates
        .iter()
        .map(|d| (d.lesson_id, d.planned_completion_date))
        .collect();
    db::study_plan::save_planned_dates(pool, user.id, &planned)
        .await
        .map_err(JsonResponse::internal_server_error)?;

    Ok(JsonResponse::ok("Planned dates saved"))
}
