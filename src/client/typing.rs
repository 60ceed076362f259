//! "Someone is typing" for one conversation.
//!
//! Own keystrokes are turned into at most one `typing` broadcast per debounce
//! window. The counterpart is shown as typing until three seconds pass without
//! a new event. Events from the own side are ignored.

use crate::realtime::TypingPayload;
use chrono::Utc;
use std::time::{Duration, Instant};
use uuid::Uuid;

pub const BROADCAST_DEBOUNCE: Duration = Duration::from_secs(1);
pub const TYPING_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone)]
pub struct TypingIndicator {
    ticket_id: Uuid,
    is_admin: bool,
    debounce: Duration,
    timeout: Duration,
    last_sent: Option<Instant>,
    counterpart_seen: Option<Instant>,
}

impl TypingIndicator {
    pub fn new(ticket_id: Uuid, is_admin: bool) -> Self {
        Self {
            ticket_id,
            is_admin,
            debounce: BROADCAST_DEBOUNCE,
            timeout: TYPING_TIMEOUT,
            last_sent: None,
            counterpart_seen: None,
        }
    }

    pub fn with_timings(mut self, debounce: Duration, timeout: Duration) -> Self {
        self.debounce = debounce;
        self.timeout = timeout;
        self
    }

    /// Payload to broadcast for a keystroke at `now`, if the debounce window has passed.
    pub fn on_keystroke(&mut self, now: Instant) -> Option<TypingPayload> {
        if let Some(last) = self.last_sent {
            if now.saturating_duration_since(last) < self.debounce {
                return None;
            }
        }
        self.last_sent = Some(now);
        Some(TypingPayload {
            ticket_id: self.ticket_id,
            is_admin: self.is_admin,
            timestamp: Utc::now(),
        })
    }

    /// Record a received event. Returns whether it counted.
    pub fn on_event(&mut self, payload: &TypingPayload, now: Instant) -> bool {
        if payload.ticket_id != self.ticket_id || payload.is_admin == self.is_admin {
            return false;
        }
        self.counterpart_seen = Some(now);
        true
    }

    pub fn is_typing(&self, now: Instant) -> bool {
        self.counterpart_seen
            .is_some_and(|seen| now.saturating_duration_since(seen) < self.timeout)
    }

    /// When the indicator will switch off on its own.
    pub fn expires_at(&self) -> Option<Instant> {
        self.counterpart_seen.map(|seen| seen + self.timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(ticket_id: Uuid, is_admin: bool) -> TypingPayload {
        TypingPayload {
            ticket_id,
            is_admin,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_keystrokes_are_debounced() {
        let start = Instant::now();
        let mut typing = TypingIndicator::new(Uuid::new_v4(), false);

        assert!(typing.on_keystroke(start).is_some());
        assert!(typing.on_keystroke(start + Duration::from_millis(300)).is_none());
        assert!(typing.on_keystroke(start + Duration::from_millis(999)).is_none());
        let sent = typing.on_keystroke(start + Duration::from_millis(1000)).unwrap();
        assert!(!sent.is_admin);
    }

    #[test]
    fn test_counterpart_expires_after_three_seconds() {
        let start = Instant::now();
        let ticket_id = Uuid::new_v4();
        let mut typing = TypingIndicator::new(ticket_id, true);

        assert!(typing.on_event(&payload(ticket_id, false), start));
        assert!(typing.is_typing(start + Duration::from_millis(2999)));
        assert!(!typing.is_typing(start + Duration::from_secs(3)));

        assert!(typing.on_event(&payload(ticket_id, false), start + Duration::from_secs(2)));
        assert!(typing.is_typing(start + Duration::from_secs(4)));
    }

    #[test]
    fn test_own_side_and_other_tickets_are_ignored() {
        let now = Instant::now();
        let ticket_id = Uuid::new_v4();
        let mut typing = TypingIndicator::new(ticket_id, true);

        assert!(!typing.on_event(&payload(ticket_id, true), now));
        assert!(!typing.on_event(&payload(Uuid::new_v4(), false), now));
        assert!(!typing.is_typing(now));
        assert!(typing.expires_at().is_none());
    }
}
