mod common;

use chrono::{NaiveDate, Utc};
use common::CUSTOMER_TOKEN;
use helpdesk::helpers::JsonBody;
use helpdesk::models::{StudyPlan, StudyStyle};
use serde_json::json;
use sqlx::PgPool;

const COURSE_ID: i32 = 7;

/// One topic with two lessons. Returns the lesson ids in order.
async fn seed_course(pool: &PgPool) -> (i32, i32) {
    let topic_id: i32 = sqlx::query_scalar(
        r#"INSERT INTO edu_topics (course_id, title, "order") VALUES ($1, 'Basics', 1) RETURNING id"#,
    )
    .bind(COURSE_ID)
    .fetch_one(pool)
    .await
    .unwrap();

    let mut ids = Vec::new();
    for (title, order) in [("Intro", 1), ("Practice", 2)] {
        let id: i32 = sqlx::query_scalar(
            r#"INSERT INTO edu_lessons (topic_id, title, "order") VALUES ($1, $2, $3) RETURNING id"#,
        )
        .bind(topic_id)
        .bind(title)
        .bind(order)
        .fetch_one(pool)
        .await
        .unwrap();
        ids.push(id);
    }
    (ids[0], ids[1])
}

async fn fetch_plan(app: &common::TestApp, client: &reqwest::Client) -> StudyPlan {
    let body: JsonBody<StudyPlan> = client
        .get(app.url(&format!("/api/study-plan/{COURSE_ID}")))
        .bearer_auth(CUSTOMER_TOKEN)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    body.item.expect("study plan")
}

#[tokio::test]
async fn unknown_course_is_not_found() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let response = reqwest::Client::new()
        .get(app.url("/api/study-plan/999"))
        .bearer_auth(CUSTOMER_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn plan_starts_today_and_is_persisted() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let (intro, _) = seed_course(&app.db_pool).await;
    let client = reqwest::Client::new();

    let plan = fetch_plan(&app, &client).await;
    assert_eq!(plan.style, StudyStyle::Linear);
    assert_eq!(plan.start_date, Utc::now().date_naive());
    assert_eq!(plan.total_topics, 1);
    let lessons = &plan.topics_progress[0].lessons_progress;
    assert_eq!(lessons.len(), 2);
    assert_eq!(lessons[0].planned_completion_date, Some(plan.start_date));

    let stored: Option<NaiveDate> = sqlx::query_scalar(
        "SELECT planned_completion_date FROM edu_lesson_progress WHERE user_id = $1 AND lesson_id = $2",
    )
    .bind(common::CUSTOMER_ID)
    .bind(intro)
    .fetch_one(&app.db_pool)
    .await
    .unwrap();
    assert_eq!(stored, Some(plan.start_date));
}

#[tokio::test]
async fn flexible_plan_keeps_edited_dates() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let (_, practice) = seed_course(&app.db_pool).await;
    let client = reqwest::Client::new();

    let response = client
        .put(app.url(&format!("/api/study-plan/{COURSE_ID}/preference")))
        .bearer_auth(CUSTOMER_TOKEN)
        .json(&json!({ "style": "flexible" }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let chosen = NaiveDate::from_ymd_opt(2031, 1, 15).unwrap();
    let response = client
        .put(app.url(&format!("/api/study-plan/{COURSE_ID}/dates")))
        .bearer_auth(CUSTOMER_TOKEN)
        .json(&json!({ "dates": [{ "lesson_id": practice, "planned_completion_date": chosen }] }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let plan = fetch_plan(&app, &client).await;
    assert_eq!(plan.style, StudyStyle::Flexible);
    let lessons = &plan.topics_progress[0].lessons_progress;
    assert_eq!(lessons[1].lesson.id, practice);
    assert_eq!(lessons[1].planned_completion_date, Some(chosen));

    let response = client
        .put(app.url(&format!("/api/study-plan/{COURSE_ID}/dates")))
        .bearer_auth(CUSTOMER_TOKEN)
        .json(&json!({ "dates": [{ "lesson_id": practice + 1000, "planned_completion_date": chosen }] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}
