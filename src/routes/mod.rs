pub mod chat;
pub mod health_checks;
pub mod meeting;
pub mod study_plan;
pub mod ticket;
pub mod user;

pub use health_checks::*;
