//! Client side of the desk: HTTP and websocket access plus the state a ticket
//! conversation view keeps (ticket buckets, the open thread, the draft being
//! composed, the typing indicator).

pub mod api;
pub mod board;
pub mod composer;
pub mod error;
pub mod messages;
pub mod realtime;
pub mod session;
pub mod thread;
pub mod typing;

pub use api::{DeskApi, DeskClient};
pub use board::TicketBoard;
pub use composer::{Composer, Draft, LocalFile};
pub use error::ClientError;
pub use messages::MessageSender;
pub use realtime::RealtimeConnection;
pub use session::{SessionEvent, TicketSession};
pub use thread::{MergeOutcome, Thread};
pub use typing::TypingIndicator;

/// Surface for user-facing error toasts.
pub trait Notifier: Send + Sync {
    fn toast(&self, title: &str, description: &str);
}

/// Notifier that only writes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn toast(&self, title: &str, description: &str) {
        tracing::warn!("{}: {}", title, description);
    }
}
