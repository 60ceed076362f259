use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text")]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum StudyStyle {
    Intensive,
    Flexible,
    #[default]
    Linear,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StudyPlanPreference {
    pub id: Option<Uuid>,
    pub user_id: Uuid,
    pub course_id: i32,
    pub style: StudyStyle,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Topic {
    pub id: i32,
    pub course_id: i32,
    pub title: String,
    pub order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Lesson {
    pub id: i32,
    pub topic_id: i32,
    pub title: String,
    pub order: i32,
}

/// Per-user progress row, absent until the learner touches the lesson.
#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct LessonProgressRow {
    pub lesson_id: i32,
    pub completed: bool,
    pub completion_date: Option<NaiveDate>,
    pub planned_completion_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonProgress {
    pub lesson: Lesson,
    pub completed: bool,
    pub completion_date: Option<NaiveDate>,
    pub planned_completion_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicProgress {
    pub topic: Topic,
    pub lessons_progress: Vec<LessonProgress>,
    pub completed_lessons_count: usize,
    pub progress_percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyPlan {
    pub course_id: i32,
    pub style: StudyStyle,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_topics: usize,
    pub completed_topics: usize,
    pub completed_topics_percentage: f64,
    pub topics_progress: Vec<TopicProgress>,
}
