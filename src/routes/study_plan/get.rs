use crate::db;
use crate::helpers::JsonResponse;
use crate::models;
use crate::services::study_plan;
use actix_web::{get, web, Responder, Result};
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;

/// GET /api/study-plan/{course_id}
/// Builds the plan from today and stores the planned dates it produced.
#[tracing::instrument(name = "Get study plan.", skip(pg_pool))]
#[get("/{course_id}")]
pub async fn item(
    user: web::ReqData<Arc<models::User>>,
    path: web::Path<(i32,)>,
    pg_pool: web::Data<PgPool>,
) -> Result<impl Responder> {
    let (course_id,) = path.into_inner();
    let pool = pg_pool.get_ref();

    let style = db::study_plan::fetch_preference(pool, user.id, course_id)
        .await
        .map_err(JsonResponse::internal_server_error)?
        .map(|preference| preference.style)
        .unwrap_or_default();

    let topics = db::study_plan::fetch_topics(pool, course_id)
        .await
        .map_err(JsonResponse::internal_server_error)?;
    if topics.is_empty() {
        return Err(JsonResponse::not_found("Course not found"));
    }
    let topic_ids: Vec<i32> = topics.iter().map(|topic| topic.id).collect();
    let lessons = db::study_plan::fetch_lessons(pool, &topic_ids)
        .await
        .map_err(JsonResponse::internal_server_error)?;
    let lesson_ids: Vec<i32> = lessons.iter().map(|lesson| lesson.id).collect();
    let progress = db::study_plan::fetch_progress(pool, user.id, &lesson_ids)
        .await
        .map_err(JsonResponse::internal_server_error)?;

    let plan = study_plan::build(
        course_id,
        Utc::now().date_naive(),
        study_plan::DEFAULT_TERM_MONTHS,
        style,
        topics,
        lessons,
        progress,
    );

    let planned: Vec<_> = plan
        .topics_progress
        .iter()
        .flat_map(|topic| topic.lessons_progress.iter())
        .filter_map(|lesson| {
            lesson
                .planned_completion_date
                .map(|date| (lesson.lesson.id, date))
        })
        .collect();
    db::study_plan::save_planned_dates(pool, user.id, &planned)
        .await
        .map_err(JsonResponse::internal_server_error)?;

    Ok(JsonResponse::build().set_item(plan).ok("OK"))
}
