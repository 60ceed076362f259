//! An open ticket conversation: routes realtime frames to the thread, the
//! board and the typing indicator.

use super::{MergeOutcome, Thread, TicketBoard, TypingIndicator};
use crate::models::{Ticket, TicketResponse};
use crate::realtime::{ChangeKind, ServerMessage, Topic, TypingPayload, TYPING_EVENT};
use std::time::Instant;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A response was merged. `scroll` asks the view to jump to the bottom,
    /// `mark_read` asks the caller to mark the counterpart's messages as read.
    ResponseMerged { scroll: bool, mark_read: bool },
    ResponseRemoved,
    TicketChanged,
    Typing,
    Status { status: String, topic: Option<String> },
    Ignored,
}

pub struct TicketSession {
    pub thread: Thread,
    pub typing: TypingIndicator,
    viewer_is_admin: bool,
}

impl TicketSession {
    pub fn open(ticket: Ticket, viewer_is_admin: bool) -> Self {
        let typing = TypingIndicator::new(ticket.id, viewer_is_admin);
        Self {
            thread: Thread::new(ticket),
            typing,
            viewer_is_admin,
        }
    }

    pub fn topic(&self) -> Topic {
        Topic::Ticket(self.thread.ticket_id())
    }

    pub fn handle(
        &mut self,
        message: ServerMessage,
        board: Option<&mut TicketBoard>,
        now: Instant,
    ) -> SessionEvent {
        match message {
            ServerMessage::PostgresChanges {
                table,
                event_type,
                record,
                ..
            } => match table.as_str() {
                "ticket_responses" => self.on_response(event_type, record),
                "tickets" => self.on_ticket(record, board),
                _ => SessionEvent::Ignored,
            },
            ServerMessage::Broadcast { event, payload, .. } if event == TYPING_EVENT => {
                match serde_json::from_value::<TypingPayload>(payload) {
                    Ok(payload) if self.typing.on_event(&payload, now) => SessionEvent::Typing,
                    _ => SessionEvent::Ignored,
                }
            }
            ServerMessage::Broadcast { .. } => SessionEvent::Ignored,
            ServerMessage::System { status, topic, .. } => SessionEvent::Status { status, topic },
        }
    }

    fn on_response(&mut self, kind: ChangeKind, record: serde_json::Value) -> SessionEvent {
        let response = match serde_json::from_value::<TicketResponse>(record) {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!("Dropping malformed response change: {}", err);
                return SessionEvent::Ignored;
            }
        };
        let from_counterpart = response.is_admin != self.viewer_is_admin && !response.is_read;
        match self.thread.merge(kind, response) {
            MergeOutcome::Inserted => SessionEvent::ResponseMerged {
                scroll: true,
                mark_read: from_counterpart,
            },
            MergeOutcome::Updated => SessionEvent::ResponseMerged {
                scroll: false,
                mark_read: false,
            },
            MergeOutcome::Removed => SessionEvent::ResponseRemoved,
            MergeOutcome::Ignored => SessionEvent::Ignored,
        }
    }

    fn on_ticket(
        &mut self,
        record: serde_json::Value,
        board: Option<&mut TicketBoard>,
    ) -> SessionEvent {
        let mut ticket = match serde_json::from_value::<Ticket>(record) {
            Ok(ticket) => ticket,
            Err(err) => {
                tracing::warn!("Dropping malformed ticket change: {}", err);
                return SessionEvent::Ignored;
            }
        };
        if ticket.id == self.thread.ticket_id() {
            // change events for the open ticket may come without the conversation
            if ticket.ticket_responses.is_empty() {
                ticket.ticket_responses = self.thread.ticket.ticket_responses.clone();
            }
            self.thread.replace_ticket(ticket.clone());
        }
        if let Some(board) = board {
            board.upsert(ticket);
        }
        SessionEvent::TicketChanged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::thread::tests::{response, ticket};
    use crate::models::TicketStatus;
    use chrono::Utc;
    use uuid::Uuid;

    fn change(table: &str, kind: ChangeKind, record: impl serde::Serialize) -> ServerMessage {
        ServerMessage::PostgresChanges {
            topic: "ticket:x".into(),
            table: table.into(),
            event_type: kind,
            record: serde_json::to_value(record).unwrap(),
        }
    }

    #[test]
    fn test_counterpart_insert_scrolls_and_marks_read() {
        let id = Uuid::new_v4();
        let mut session = TicketSession::open(ticket(id), false);
        let now = Instant::now();

        let event = session.handle(
            change("ticket_responses", ChangeKind::Insert, response(id, 5, true)),
            None,
            now,
        );
        assert_eq!(
            event,
            SessionEvent::ResponseMerged {
                scroll: true,
                mark_read: true
            }
        );

        let event = session.handle(
            change("ticket_responses", ChangeKind::Insert, response(id, 6, false)),
            None,
            now,
        );
        assert_eq!(
            event,
            SessionEvent::ResponseMerged {
                scroll: true,
                mark_read: false
            }
        );
        assert_eq!(session.thread.responses().len(), 2);
    }

    #[test]
    fn test_typing_broadcast_from_counterpart() {
        let id = Uuid::new_v4();
        let mut session = TicketSession::open(ticket(id), true);
        let now = Instant::now();
        let payload = TypingPayload {
            ticket_id: id,
            is_admin: false,
            timestamp: Utc::now(),
        };
        let message = ServerMessage::Broadcast {
            topic: session.topic().to_string(),
            event: TYPING_EVENT.into(),
            payload: serde_json::to_value(&payload).unwrap(),
        };
        assert_eq!(session.handle(message, None, now), SessionEvent::Typing);
        assert!(session.typing.is_typing(now));
    }

    #[test]
    fn test_ticket_change_updates_board_and_keeps_thread() {
        let id = Uuid::new_v4();
        let mut opened = ticket(id);
        opened.ticket_responses.push(response(id, 1, false));
        let mut session = TicketSession::open(opened.clone(), true);
        let mut board = TicketBoard::new(true);
        board.upsert(opened.clone());

        let mut changed = opened;
        changed.status = TicketStatus::InProgress;
        changed.ticket_responses.clear();
        let event = session.handle(
            change("tickets", ChangeKind::Update, &changed),
            Some(&mut board),
            Instant::now(),
        );

        assert_eq!(event, SessionEvent::TicketChanged);
        assert_eq!(session.thread.ticket.status, TicketStatus::InProgress);
        assert_eq!(session.thread.responses().len(), 1);
        assert_eq!(
            board.bucket(TicketStatus::InProgress).unwrap().tickets.len(),
            1
        );
    }

    #[test]
    fn test_deleted_response_leaves_thread() {
        let id = Uuid::new_v4();
        let mut opened = ticket(id);
        let doomed = response(id, 1, true);
        opened.ticket_responses.push(doomed.clone());
        let mut session = TicketSession::open(opened, false);

        let event = session.handle(
            change("ticket_responses", ChangeKind::Delete, &doomed),
            None,
            Instant::now(),
        );
        assert_eq!(event, SessionEvent::ResponseRemoved);
        assert!(session.thread.responses().is_empty());

        let event = session.handle(
            change("ticket_responses", ChangeKind::Delete, &doomed),
            None,
            Instant::now(),
        );
        assert_eq!(event, SessionEvent::Ignored);
    }
}
