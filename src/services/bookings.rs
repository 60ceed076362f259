//! Active / inactive split of an organization's bookings.

use crate::models::Meeting;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingFilter {
    #[default]
    Active,
    Inactive,
}

impl BookingFilter {
    pub fn toggle(self) -> Self {
        match self {
            BookingFilter::Active => BookingFilter::Inactive,
            BookingFilter::Inactive => BookingFilter::Active,
        }
    }
}

/// What the bookings list shows for one filter. `other_count` is the badge on the
/// toggle button, i.e. how many bookings the other filter would show.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingView {
    pub filter: BookingFilter,
    pub total: usize,
    pub displayed_count: usize,
    pub other_count: usize,
    pub bookings: Vec<Meeting>,
}

/// Split the fetched bookings. Active ones come nearest first, inactive ones most recent first.
pub fn view(meetings: &[Meeting], filter: BookingFilter, now: DateTime<Utc>) -> BookingView {
    let (mut active, mut inactive): (Vec<Meeting>, Vec<Meeting>) = meetings
        .iter()
        .cloned()
        .partition(|meeting| meeting.is_active_at(now));
    active.sort_by_key(|m| m.starts_at);
    inactive.sort_by(|a, b| b.starts_at.cmp(&a.starts_at));

    let (bookings, other_count) = match filter {
        BookingFilter::Active => (active, inactive.len()),
        BookingFilter::Inactive => (inactive, active.len()),
    };

    BookingView {
        filter,
        total: meetings.len(),
        displayed_count: bookings.len(),
        other_count,
        bookings,
    }
}
