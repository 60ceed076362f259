use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Ticket status as stored in `tickets.status`. Any status may follow any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text")]
pub enum TicketStatus {
    #[serde(rename = "open")]
    #[sqlx(rename = "open")]
    Open,
    #[serde(rename = "in progress")]
    #[sqlx(rename = "in progress")]
    InProgress,
    #[serde(rename = "closed")]
    #[sqlx(rename = "closed")]
    Closed,
}

impl TicketStatus {
    /// Buckets in the order the ticket list tabs show them.
    pub const ALL: [TicketStatus; 3] = [
        TicketStatus::InProgress,
        TicketStatus::Open,
        TicketStatus::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::InProgress => "in progress",
            TicketStatus::Closed => "closed",
        }
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['_', '-'], " ").as_str() {
            "open" => Ok(TicketStatus::Open),
            "in progress" => Ok(TicketStatus::InProgress),
            "closed" => Ok(TicketStatus::Closed),
            other => Err(format!("unknown ticket status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text")]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum TicketPriority {
    Low,
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Ticket {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub customer_id: Uuid,
    pub subject: String,
    pub message: String,
    pub status: TicketStatus,
    pub priority: Option<TicketPriority>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub preferred_contact_method: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    #[serde(default)]
    pub ticket_responses: Vec<TicketResponse>,
    #[sqlx(skip)]
    #[serde(default)]
    pub tags: Vec<TicketTag>,
    /// Internal note count, only filled in for admins.
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<NoteSummary>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteSummary {
    pub count: i64,
    pub pinned: bool,
}

impl Ticket {
    /// Unread responses written by the other side of the conversation.
    pub fn unread_count(&self, viewer_is_admin: bool) -> usize {
        self.ticket_responses
            .iter()
            .filter(|r| r.is_admin != viewer_is_admin && !r.is_read)
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TicketResponse {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub user_id: Option<Uuid>,
    pub message: String,
    pub is_admin: bool,
    pub avatar_id: Option<Uuid>,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[sqlx(skip)]
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Attachment {
    pub id: Uuid,
    pub response_id: Uuid,
    pub ticket_id: Uuid,
    pub file_path: String,
    pub file_name: String,
    pub file_size: i64,
    pub file_type: String,
    pub uploaded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TicketTag {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TicketNote {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub admin_id: Uuid,
    pub note_text: String,
    pub is_pinned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing_accepts_ui_spellings() {
        assert_eq!("open".parse::<TicketStatus>(), Ok(TicketStatus::Open));
        assert_eq!(
            "in progress".parse::<TicketStatus>(),
            Ok(TicketStatus::InProgress)
        );
        assert_eq!(
            "in_progress".parse::<TicketStatus>(),
            Ok(TicketStatus::InProgress)
        );
        assert_eq!(" Closed ".parse::<TicketStatus>(), Ok(TicketStatus::Closed));
        assert!("archived".parse::<TicketStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_with_space() {
        let json = serde_json::to_string(&TicketStatus::InProgress).unwrap();
        assert_eq!(json, "\"in progress\"");
        let back: TicketStatus = serde_json::from_str("\"closed\"").unwrap();
        assert_eq!(back, TicketStatus::Closed);
    }
}
