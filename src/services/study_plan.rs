//! Spreads a course's lessons over a study term.

use crate::models::{
    Lesson, LessonProgress, LessonProgressRow, StudyPlan, StudyStyle, Topic, TopicProgress,
};
use chrono::{Duration, Months, NaiveDate};
use std::collections::HashMap;

pub const DEFAULT_TERM_MONTHS: u32 = 6;

/// Share of the term an intensive learner plans to use.
const INTENSIVE_SHARE: f64 = 0.5;

/// Days available for the plan: the whole term, half of it when intensive.
pub fn effective_days(start: NaiveDate, end: NaiveDate, style: StudyStyle) -> f64 {
    let total_days = (end - start).num_days() as f64;
    match style {
        StudyStyle::Intensive => total_days * INTENSIVE_SHARE,
        StudyStyle::Flexible | StudyStyle::Linear => total_days,
    }
}

/// Lesson `i` of `count` lands on `start + i * (days / count)`, fractions truncated.
pub fn planned_date(start: NaiveDate, index: usize, days: f64, count: usize) -> NaiveDate {
    let per_lesson = if count > 0 { days / count as f64 } else { 0.0 };
    let offset = (index as f64 * per_lesson).trunc() as i64;
    start + Duration::days(offset)
}

pub fn term_end(start: NaiveDate, months: u32) -> NaiveDate {
    start.checked_add_months(Months::new(months)).unwrap_or(start)
}

/// Build the plan for one learner. Lessons are ordered by topic order then lesson order.
/// In flexible style a lesson that already has a planned date keeps it.
pub fn build(
    course_id: i32,
    start: NaiveDate,
    term_months: u32,
    style: StudyStyle,
    topics: Vec<Topic>,
    lessons: Vec<Lesson>,
    progress: Vec<LessonProgressRow>,
) -> StudyPlan {
    let end = term_end(start, term_months);
    let days = effective_days(start, end, style);

    let topic_order: HashMap<i32, i32> = topics.iter().map(|t| (t.id, t.order)).collect();
    let mut progress: HashMap<i32, LessonProgressRow> =
        progress.into_iter().map(|p| (p.lesson_id, p)).collect();

    let mut lessons = lessons;
    lessons.sort_by_key(|l| (topic_order.get(&l.topic_id).copied().unwrap_or(0), l.order));

    let count = lessons.len();
    let planned: Vec<LessonProgress> = lessons
        .into_iter()
        .enumerate()
        .map(|(index, lesson)| {
            let row = progress.remove(&lesson.id).unwrap_or_default();
            let planned_completion_date = match (style, row.planned_completion_date) {
                (StudyStyle::Flexible, Some(date)) => date,
                _ => planned_date(start, index, days, count),
            };
            LessonProgress {
                lesson,
                completed: row.completed,
                completion_date: row.completion_date,
                planned_completion_date: Some(planned_completion_date),
            }
        })
        .collect();

    let mut by_topic: HashMap<i32, Vec<LessonProgress>> = HashMap::new();
    for lesson in planned {
        by_topic.entry(lesson.lesson.topic_id).or_default().push(lesson);
    }

    let topics_progress: Vec<TopicProgress> = topics
        .into_iter()
        .map(|topic| {
            let lessons_progress = by_topic.remove(&topic.id).unwrap_or_default();
            let completed_lessons_count = lessons_progress.iter().filter(|l| l.completed).count();
            TopicProgress {
                progress_percentage: percentage(completed_lessons_count, lessons_progress.len()),
                topic,
                lessons_progress,
                completed_lessons_count,
            }
        })
        .collect();

    let total_topics = topics_progress.len();
    let completed_topics = topics_progress
        .iter()
        .filter(|t| t.progress_percentage >= 100.0)
        .count();

    StudyPlan {
        course_id,
        style,
        start_date: start,
        end_date: end,
        total_topics,
        completed_topics,
        completed_topics_percentage: percentage(completed_topics, total_topics),
        topics_progress,
    }
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn topic(id: i32, order: i32) -> Topic {
        Topic {
            id,
            course_id: 1,
            title: format!("topic {id}"),
            order,
        }
    }

    fn lesson(id: i32, topic_id: i32, order: i32) -> Lesson {
        Lesson {
            id,
            topic_id,
            title: format!("lesson {id}"),
            order,
        }
    }

    #[test]
    fn test_linear_spreads_over_whole_term() {
        let start = date(2025, 1, 1);
        let end = term_end(start, 6);
        assert_eq!(end, date(2025, 7, 1));
        let days = effective_days(start, end, StudyStyle::Linear);
        assert_eq!(days, 181.0);

        for i in 0..4 {
            let expected = start + Duration::days((i as f64 * (181.0 / 4.0)).trunc() as i64);
            assert_eq!(planned_date(start, i, days, 4), expected);
        }
        assert_eq!(planned_date(start, 0, days, 4), start);
        assert_eq!(planned_date(start, 1, days, 4), date(2025, 2, 15));
    }

    #[test]
    fn test_intensive_uses_half_the_term() {
        let start = date(2025, 1, 1);
        let end = term_end(start, 6);
        let days = effective_days(start, end, StudyStyle::Intensive);
        assert_eq!(days, 90.5);
        assert_eq!(planned_date(start, 2, days, 2), start + Duration::days(90));
    }

    #[test]
    fn test_no_lessons_plans_nothing() {
        assert_eq!(planned_date(date(2025, 1, 1), 3, 100.0, 0), date(2025, 1, 1));
        let plan = build(
            1,
            date(2025, 1, 1),
            6,
            StudyStyle::Linear,
            vec![topic(1, 0)],
            vec![],
            vec![],
        );
        assert_eq!(plan.total_topics, 1);
        assert_eq!(plan.completed_topics, 0);
        assert_eq!(plan.topics_progress[0].progress_percentage, 0.0);
    }

    #[test]
    fn test_lessons_ordered_by_topic_then_lesson() {
        let start = date(2025, 1, 1);
        // topic 2 comes first by order
        let topics = vec![topic(1, 2), topic(2, 1)];
        let lessons = vec![lesson(10, 1, 1), lesson(20, 2, 2), lesson(21, 2, 1)];
        let plan = build(1, start, 6, StudyStyle::Linear, topics, lessons, vec![]);

        let dates: HashMap<i32, NaiveDate> = plan
            .topics_progress
            .iter()
            .flat_map(|t| t.lessons_progress.iter())
            .map(|l| (l.lesson.id, l.planned_completion_date.unwrap()))
            .collect();
        assert_eq!(dates[&21], start);
        assert!(dates[&20] > dates[&21]);
        assert!(dates[&10] > dates[&20]);
    }

    #[test]
    fn test_flexible_keeps_existing_dates() {
        let start = date(2025, 1, 1);
        let kept = date(2025, 3, 3);
        let progress = vec![LessonProgressRow {
            lesson_id: 2,
            completed: false,
            completion_date: None,
            planned_completion_date: Some(kept),
        }];
        let lessons = vec![lesson(1, 1, 1), lesson(2, 1, 2)];

        let flexible = build(
            1,
            start,
            6,
            StudyStyle::Flexible,
            vec![topic(1, 1)],
            lessons.clone(),
            progress.clone(),
        );
        assert_eq!(
            flexible.topics_progress[0].lessons_progress[1].planned_completion_date,
            Some(kept)
        );

        let linear = build(1, start, 6, StudyStyle::Linear, vec![topic(1, 1)], lessons, progress);
        assert_ne!(
            linear.topics_progress[0].lessons_progress[1].planned_completion_date,
            Some(kept)
        );
    }

    #[test]
    fn test_topic_and_course_percentages() {
        let progress = vec![
            LessonProgressRow {
                lesson_id: 1,
                completed: true,
                ..Default::default()
            },
            LessonProgressRow {
                lesson_id: 2,
                completed: true,
                ..Default::default()
            },
            LessonProgressRow {
                lesson_id: 3,
                completed: true,
                ..Default::default()
            },
        ];
        let plan = build(
            1,
            date(2025, 1, 1),
            6,
            StudyStyle::Linear,
            vec![topic(1, 1), topic(2, 2)],
            vec![lesson(1, 1, 1), lesson(2, 1, 2), lesson(3, 2, 1), lesson(4, 2, 2)],
            progress,
        );
        assert_eq!(plan.topics_progress[0].progress_percentage, 100.0);
        assert_eq!(plan.topics_progress[1].progress_percentage, 50.0);
        assert_eq!(plan.topics_progress[1].completed_lessons_count, 1);
        assert_eq!(plan.completed_topics, 1);
        assert_eq!(plan.completed_topics_percentage, 50.0);
    }
}
