use crate::models::{TicketPriority, TicketStatus};
use serde::{Deserialize, Serialize};
use serde_valid::Validate;
use uuid::Uuid;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

impl ListQuery {
    pub fn status(&self) -> Result<TicketStatus, String> {
        self.status
            .as_deref()
            .unwrap_or("open")
            .parse::<TicketStatus>()
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }
}

#[derive(Serialize, Deserialize, Debug, Validate)]
pub struct CreateTicket {
    #[validate(min_length = 1)]
    #[validate(max_length = 255)]
    pub subject: String,
    #[validate(min_length = 1)]
    #[validate(max_length = 5000)]
    pub message: String,
    #[validate(max_length = 255)]
    pub email: Option<String>,
    #[validate(max_length = 255)]
    pub full_name: Option<String>,
    #[validate(max_length = 50)]
    pub preferred_contact_method: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct UpdateStatus {
    pub ticket_id: Uuid,
    pub status: TicketStatus,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct AssignTicket {
    pub ticket_id: Uuid,
    pub assigned_to: Option<Uuid>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct UpdatePriority {
    pub ticket_id: Uuid,
    pub priority: Option<TicketPriority>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct MarkRead {
    #[serde(alias = "ticketId")]
    pub ticket_id: Uuid,
}

/// A file already uploaded to object storage.
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct AttachmentMeta {
    #[validate(min_length = 1)]
    pub path: String,
    #[validate(min_length = 1)]
    #[validate(max_length = 255)]
    pub name: String,
    #[serde(rename = "type")]
    pub file_type: String,
    #[validate(minimum = 0)]
    pub size: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct NewResponse {
    #[serde(default)]
    #[validate(max_length = 10000)]
    pub message: String,
    #[serde(default)]
    pub avatar_id: Option<Uuid>,
    #[serde(default)]
    #[validate(max_items = 10)]
    #[validate]
    pub attachments: Vec<AttachmentMeta>,
}

impl NewResponse {
    /// A response needs text or at least one file.
    pub fn is_empty(&self) -> bool {
        self.message.trim().is_empty() && self.attachments.is_empty()
    }
}

#[derive(Serialize, Deserialize, Debug, Validate)]
pub struct NoteForm {
    #[validate(min_length = 1)]
    #[validate(max_length = 5000)]
    pub note_text: String,
    #[serde(default)]
    pub is_pinned: bool,
}
