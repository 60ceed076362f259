//! Row-change and broadcast channels pushed to websocket clients.

pub mod events;
pub mod hub;
pub mod websocket;

pub use events::{ChangeKind, ClientMessage, ServerMessage, Topic, TypingPayload, TYPING_EVENT};
pub use hub::RealtimeHub;
pub use websocket::realtime_websocket;
