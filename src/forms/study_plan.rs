use crate::models::StudyStyle;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_valid::Validate;

#[derive(Debug, Serialize, Deserialize)]
pub struct PreferenceForm {
    pub style: StudyStyle,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedDate {
    pub lesson_id: i32,
    pub planned_completion_date: NaiveDate,
}

/// Dates a learner edited by hand in flexible mode.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct PlannedDatesForm {
    #[validate(min_items = 1)]
    #[validate(max_items = 500)]
    pub dates: Vec<PlannedDate>,
}
