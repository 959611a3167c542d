//! In-memory state owned by the UI loop — chat messages and error notices.

pub mod chat;
pub mod errors;

pub use chat::{ChatSession, MessagePatch, MessageRole, SessionMessage};
pub use errors::{
    Action, ERROR_HISTORY_CAPACITY, ErrorKind, ErrorProfile, ErrorRecord, ErrorStore,
    MAX_AUTO_RETRIES, Severity,
};
