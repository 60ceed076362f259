use crate::models::{Lesson, LessonProgressRow, StudyPlanPreference, StudyStyle, Topic};
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

pub async fn fetch_topics(pool: &PgPool, course_id: i32) -> Result<Vec<Topic>, String> {
    sqlx::query_as::<_, Topic>(
        r#"SELECT id, course_id, title, "order" FROM edu_topics WHERE course_id = $1 ORDER BY "order", id"#,
    )
    .bind(course_id)
    .fetch_all(pool)
    .await
    .map_err(|err| {
        tracing::error!("Failed to fetch topics: {:?}", err);
        "Failed to fetch topics".to_string()
    })
}

pub async fn fetch_lessons(pool: &PgPool, topic_ids: &[i32]) -> Result<Vec<Lesson>, String> {
    sqlx::query_as::<_, Lesson>(
        r#"SELECT id, topic_id, title, "order" FROM edu_lessons WHERE topic_id = ANY($1) ORDER BY "order", id"#,
    )
    .bind(topic_ids)
    .fetch_all(pool)
    .await
    .map_err(|err| {
        tracing::error!("Failed to fetch lessons: {:?}", err);
        "Failed to fetch lessons".to_string()
    })
}

pub async fn fetch_progress(
    pool: &PgPool,
    user_id: Uuid,
    lesson_ids: &[i32],
) -> Result<Vec<LessonProgressRow>, String> {
    sqlx::query_as::<_, LessonProgressRow>(
        r#"SELECT lesson_id, completed, completion_date, planned_completion_date
        FROM edu_lesson_progress WHERE user_id = $1 AND lesson_id = ANY($2)"#,
    )
    .bind(user_id)
    .bind(lesson_ids)
    .fetch_all(pool)
    .await
    .map_err(|err| {
        tracing::error!("Failed to fetch lesson progress: {:?}", err);
        "Failed to fetch lesson progress".to_string()
    })
}

pub async fn fetch_preference(
    pool: &PgPool,
    user_id: Uuid,
    course_id: i32,
) -> Result<Option<StudyPlanPreference>, String> {
    sqlx::query_as::<_, StudyPlanPreference>(
        r#"SELECT id, user_id, course_id, style FROM edu_study_plan_preferences
        WHERE user_id = $1 AND course_id = $2"#,
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_optional(pool)
    .await
    .map_err(|err| {
        tracing::error!("Failed to fetch study plan preference: {:?}", err);
        "Failed to fetch study plan preference".to_string()
    })
}

#[tracing::instrument(name = "Upsert study plan preference.", skip(pool))]
pub async fn upsert_preference(
    pool: &PgPool,
    user_id: Uuid,
    course_id: i32,
    style: StudyStyle,
) -> Result<StudyPlanPreference, String> {
    sqlx::query_as::<_, StudyPlanPreference>(
        r#"INSERT INTO edu_study_plan_preferences (user_id, course_id, style)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, course_id) DO UPDATE SET style = EXCLUDED.style
        RETURNING id, user_id, course_id, style"#,
    )
    .bind(user_id)
    .bind(course_id)
    .bind(style)
    .fetch_one(pool)
    .await
    .map_err(|err| {
        tracing::error!("Failed to save study plan preference: {:?}", err);
        "Failed to save study plan preference".to_string()
    })
}

/// Store planned completion dates, keeping `completed` and `completion_date` untouched.
#[tracing::instrument(name = "Save planned lesson dates.", skip(pool, planned))]
pub async fn save_planned_dates(
    pool: &PgPool,
    user_id: Uuid,
    planned: &[(i32, NaiveDate)],
) -> Result<(), String> {
    let mut tx = pool.begin().await.map_err(|err| {
        tracing::error!("Failed to begin transaction: {:?}", err);
        "Failed to save study plan".to_string()
    })?;

    for (lesson_id, date) in planned {
        sqlx::query(
            r#"INSERT INTO edu_lesson_progress (user_id, lesson_id, planned_completion_date)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, lesson_id) DO UPDATE SET planned_completion_date = EXCLUDED.planned_completion_date"#,
        )
        .bind(user_id)
        .bind(*lesson_id)
        .bind(*date)
        .execute(&mut *tx)
        .await
        .map_err(|err| {
            tracing::error!("Failed to save planned date for lesson {}: {:?}", lesson_id, err);
            "Failed to save study plan".to_string()
        })?;
    }

    tx.commit().await.map_err(|err| {
        tracing::error!("Failed to commit study plan: {:?}", err);
        "Failed to save study plan".to_string()
    })
}
