use crate::db::meeting::MeetingFields;
use crate::models::MeetingStatus;
use crate::services::bookings::BookingFilter;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_valid::Validate;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct MeetingsQuery {
    #[serde(default)]
    pub filter: BookingFilter,
}

#[derive(Serialize, Deserialize, Debug, Validate)]
pub struct MeetingForm {
    pub customer_id: Option<Uuid>,
    #[validate(min_length = 1)]
    #[validate(max_length = 255)]
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: Option<MeetingStatus>,
    #[validate(max_length = 5000)]
    pub notes: Option<String>,
}

impl MeetingForm {
    pub fn check_period(&self) -> Result<(), String> {
        if self.ends_at <= self.starts_at {
            return Err("Meeting must end after it starts".to_string());
        }
        Ok(())
    }
}

impl From<MeetingForm> for MeetingFields {
    fn from(form: MeetingForm) -> Self {
        MeetingFields {
            customer_id: form.customer_id,
            title: form.title,
            starts_at: form.starts_at,
            ends_at: form.ends_at,
            status: form.status.unwrap_or(MeetingStatus::Scheduled),
            notes: form.notes,
        }
    }
}
