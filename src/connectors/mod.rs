//! External service connectors.
//!
//! Routes and the client talk to object storage and model providers only through the
//! traits defined here, so tests can swap in wiremock-backed or in-memory versions.

pub mod errors;
pub mod llm;
pub mod storage;

pub use errors::ConnectorError;
pub use llm::{ChatCompletion, ChatMessage, LlmClient, LlmError, ProviderKind};
pub use storage::{HttpObjectStorage, ObjectStorage, StorageError};
