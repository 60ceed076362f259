pub mod chat;
pub mod meeting;
pub mod study_plan;
pub mod ticket;
pub mod user;

pub use user::UserForm;
