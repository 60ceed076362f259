mod ai_model;
mod avatar;
mod meeting;
mod profile;
mod study_plan;
mod ticket;
pub mod user;

pub use ai_model::*;
pub use avatar::*;
pub use meeting::*;
pub use profile::*;
pub use study_plan::*;
pub use ticket::*;
pub use user::*;
