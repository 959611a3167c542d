//! Responders — the mock and LLM backends behind one streaming contract.

pub mod command;
pub mod event;
pub mod llm;
pub mod mock;

use std::pin::Pin;

use async_trait::async_trait;
use futures::{Stream, StreamExt};

use crate::error::ResponderError;

pub use command::{Command, Literal};
pub use event::{CardView, Component, DeckMode, DeckView, ResponseEvent, SpreadView};
pub use llm::{FailureNotice, LlmResponder, LlmResponderConfig};
pub use mock::{MockConfig, MockResponder};

/// A lazy, finite sequence of response events for one user message.
///
/// A typed `Err` item ends the stream; so do `Done` and `Error` events.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<ResponseEvent, ResponderError>> + Send>>;

/// A backend that answers user messages with a stream of events.
#[async_trait]
pub trait Responder: Send + Sync {
    /// Short name for logs ("mock", "llm").
    fn name(&self) -> &str;

    /// Start a fresh response stream for `user_message`.
    fn stream_response(&self, user_message: &str) -> EventStream;

    /// Forget any conversation history. No-op for stateless responders.
    async fn clear_history(&self) {}

    /// Non-streaming convenience: the concatenated text of one response.
    async fn send_message(&self, user_message: &str) -> Result<String, ResponderError> {
        let mut stream = self.stream_response(user_message);
        let mut text = String::new();
        while let Some(item) = stream.next().await {
            match item? {
                ResponseEvent::Text { chunk, .. } => text.push_str(&chunk),
                ResponseEvent::Error { message, code } => {
                    return Err(ResponderError::Reported { message, code });
                }
                ResponseEvent::Component(_) | ResponseEvent::Done { .. } => {}
            }
        }
        Ok(text)
    }
}
