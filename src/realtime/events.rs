use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub const TYPING_EVENT: &str = "typing";

pub const STATUS_SUBSCRIBED: &str = "SUBSCRIBED";
pub const STATUS_CLOSED: &str = "CLOSED";
pub const STATUS_ERROR: &str = "CHANNEL_ERROR";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// Frames a connected client may send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Subscribe {
        topic: String,
    },
    Unsubscribe {
        topic: String,
    },
    Broadcast {
        topic: String,
        event: String,
        #[serde(default)]
        payload: Value,
    },
}

/// Frames the server pushes to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    PostgresChanges {
        topic: String,
        table: String,
        event_type: ChangeKind,
        record: Value,
    },
    Broadcast {
        topic: String,
        event: String,
        payload: Value,
    },
    System {
        status: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        topic: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl ServerMessage {
    pub fn topic(&self) -> Option<&str> {
        match self {
            ServerMessage::PostgresChanges { topic, .. } | ServerMessage::Broadcast { topic, .. } => {
                Some(topic)
            }
            ServerMessage::System { topic, .. } => topic.as_deref(),
        }
    }

    pub fn system(status: &str, topic: Option<&str>, message: Option<String>) -> Self {
        ServerMessage::System {
            status: status.to_string(),
            topic: topic.map(str::to_string),
            message,
        }
    }
}

/// Ephemeral payload of a `typing` broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypingPayload {
    pub ticket_id: Uuid,
    pub is_admin: bool,
    pub timestamp: DateTime<Utc>,
}

/// Overwrites `is_admin` of a relayed typing payload with the sender's real role.
pub fn stamp_typing(event: &str, mut payload: Value, is_admin: bool) -> Value {
    if event == TYPING_EVENT {
        if let Some(fields) = payload.as_object_mut() {
            fields.insert("is_admin".to_string(), Value::Bool(is_admin));
        }
    }
    payload
}

/// Channel topics understood by the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    /// `ticket:{id}` responses and typing of one conversation
    Ticket(Uuid),
    /// `tickets:{organization_id}` ticket list changes
    Organization(Uuid),
}

impl Topic {
    pub fn parse(topic: &str) -> Option<Self> {
        let (kind, id) = topic.split_once(':')?;
        let id = Uuid::parse_str(id).ok()?;
        match kind {
            "ticket" => Some(Topic::Ticket(id)),
            "tickets" => Some(Topic::Organization(id)),
            _ => None,
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Topic::Ticket(id) => write!(f, "ticket:{}", id),
            Topic::Organization(id) => write!(f, "tickets:{}", id),
        }
    }
}
