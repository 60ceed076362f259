pub mod ai;
pub mod attachment;
pub mod avatar;
pub mod meeting;
pub mod note;
pub mod profile;
pub mod response;
pub mod study_plan;
pub mod ticket;
