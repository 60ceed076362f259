pub mod bookings;
pub mod chat;
pub mod study_plan;
