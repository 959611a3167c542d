//! Turn driver — applies one responder stream to the chat and error stores.

use futures::StreamExt;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;
use uuid::Uuid;

use crate::recovery::{ErrorHandler, Failure};
use crate::responder::llm::FailureNotice;
use crate::responder::{Responder, ResponseEvent};
use crate::store::{ChatSession, ErrorKind, MessagePatch, MessageRole, SessionMessage};

/// How a turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Completed { text: String },
    Failed { kind: ErrorKind, message: String },
}

/// Borrowed UI state one turn writes into.
pub struct TurnDriver<'a> {
    chat: &'a mut ChatSession,
    errors: &'a mut ErrorHandler,
    failures: Option<&'a mut UnboundedReceiver<FailureNotice>>,
}

impl<'a> TurnDriver<'a> {
    pub fn new(chat: &'a mut ChatSession, errors: &'a mut ErrorHandler) -> Self {
        Self {
            chat,
            errors,
            failures: None,
        }
    }

    /// Prefer typed failure notices over in-band error events when classifying.
    pub fn with_failures(mut self, rx: &'a mut UnboundedReceiver<FailureNotice>) -> Self {
        self.failures = Some(rx);
        self
    }

    /// Send `input` to `responder` and apply every event in order.
    ///
    /// `observer` sees each event as it arrives; typed stream errors are
    /// shown to it as `Error` events.
    pub async fn run(
        &mut self,
        responder: &dyn Responder,
        input: &str,
        observer: &mut (dyn FnMut(&ResponseEvent) + Send),
    ) -> TurnOutcome {
        self.chat.append(SessionMessage::user(input));
        let mut stream = responder.stream_response(input);
        let mut open: Option<Uuid> = None;

        while let Some(item) = stream.next().await {
            let event = match item {
                Ok(event) => event,
                Err(err) => {
                    let message = err.to_string();
                    observer(&ResponseEvent::error(message.clone(), err.code()));
                    let kind = self.errors.handle_llm_error(&err);
                    self.mark_failed(open, &message);
                    return TurnOutcome::Failed { kind, message };
                }
            };
            observer(&event);

            match event {
                ResponseEvent::Text { full_text, .. } => {
                    let id = *open
                        .get_or_insert_with(|| self.chat.append(SessionMessage::placeholder()));
                    let content = self.segment_text(id, &full_text);
                    self.chat.update_by_id(id, MessagePatch::content(content));
                }
                ResponseEvent::Component(component) => {
                    self.finish(open.take());
                    self.chat.append(SessionMessage::with_component(component));
                }
                ResponseEvent::Done { full_text } => {
                    self.finish(open.take());
                    debug!(responder = responder.name(), chars = full_text.len(), "Turn complete");
                    return TurnOutcome::Completed { text: full_text };
                }
                ResponseEvent::Error { message, code } => {
                    let notice = self.failures.as_mut().and_then(|rx| rx.try_recv().ok());
                    let kind = match notice {
                        Some(notice) => {
                            self.errors.set_provider(notice.provider);
                            self.errors.handle_llm_error(&notice.error)
                        }
                        None => {
                            let failure = Failure {
                                code,
                                ..Failure::new(message.clone())
                            };
                            self.errors.handle_llm_error(&failure)
                        }
                    };
                    self.mark_failed(open, &message);
                    return TurnOutcome::Failed { kind, message };
                }
            }
        }

        // Stream ended without a terminal event.
        self.finish(open);
        let text = self
            .chat
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        TurnOutcome::Completed { text }
    }

    /// Text that belongs in the open message.
    ///
    /// `full_text` covers the whole turn; earlier text already sits in
    /// messages closed by a component, so only the tail since then is shown.
    fn segment_text(&self, id: Uuid, full_text: &str) -> String {
        let before: usize = self
            .chat
            .messages()
            .iter()
            .rev()
            .skip_while(|m| m.id != id)
            .skip(1)
            .take_while(|m| m.role != MessageRole::User)
            .map(|m| m.content.len())
            .sum();
        full_text.get(before..).unwrap_or(full_text).to_string()
    }

    fn finish(&mut self, id: Option<Uuid>) {
        if let Some(id) = id {
            self.chat.update_by_id(id, MessagePatch::default().finished());
        }
    }

    fn mark_failed(&mut self, open: Option<Uuid>, message: &str) {
        let id = open.unwrap_or_else(|| self.chat.append(SessionMessage::assistant("")));
        self.chat
            .update_by_id(id, MessagePatch::default().finished().with_error(message));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use futures::stream;
    use tokio::sync::mpsc;

    use super::*;
    use crate::deck::{DrawnCard, Orientation};
    use crate::error::{ErrorCode, LlmError, ResponderError};
    use crate::llm::Provider;
    use crate::locale::Locale;
    use crate::responder::{Component, EventStream, MockConfig, MockResponder};

    /// Replays a fixed event list.
    struct Canned(Vec<ResponseEvent>);

    #[async_trait]
    impl Responder for Canned {
        fn name(&self) -> &str {
            "canned"
        }

        fn stream_response(&self, _user_message: &str) -> EventStream {
            Box::pin(stream::iter(self.0.clone().into_iter().map(Ok)))
        }
    }

    fn mock() -> MockResponder {
        MockResponder::new(MockConfig::instant(), Locale::En)
    }

    #[tokio::test]
    async fn streamed_text_lands_in_one_message() {
        let mut chat = ChatSession::new();
        let mut errors = ErrorHandler::default();
        let mut seen = 0;

        let outcome = TurnDriver::new(&mut chat, &mut errors)
            .run(&mock(), "/help", &mut |_| seen += 1)
            .await;

        let help = Locale::En.strings().help;
        assert_eq!(outcome, TurnOutcome::Completed { text: help.to_string() });
        assert_eq!(chat.len(), 2);
        assert_eq!(chat.messages()[0].role, MessageRole::User);
        assert_eq!(chat.messages()[1].content, help);
        assert!(!chat.messages()[1].streaming);
        assert_eq!(seen, help.chars().count() + 1);
    }

    #[tokio::test]
    async fn component_gets_its_own_message() {
        let mut chat = ChatSession::new();
        let mut errors = ErrorHandler::default();

        let outcome = TurnDriver::new(&mut chat, &mut errors)
            .run(&mock(), "/draw", &mut |_| {})
            .await;

        // Stream ends right after the component.
        assert!(matches!(outcome, TurnOutcome::Completed { .. }));
        assert_eq!(chat.len(), 2);
        assert!(matches!(
            chat.messages()[1].component,
            Some(Component::TarotCard(_))
        ));
    }

    #[tokio::test]
    async fn simulated_error_is_classified() {
        let mut chat = ChatSession::new();
        let mut errors = ErrorHandler::default();

        let outcome = TurnDriver::new(&mut chat, &mut errors)
            .run(&mock(), "/error-stream", &mut |_| {})
            .await;

        match outcome {
            TurnOutcome::Failed { kind, .. } => assert_eq!(kind, ErrorKind::LlmStreamingError),
            other => panic!("expected failure, got {:?}", other),
        }
        let partial = chat.last().unwrap();
        assert_eq!(partial.content, "The cards reveal...");
        assert!(partial.error.is_some());
        assert!(!partial.streaming);
        assert!(errors.store().has_active_error());
    }

    #[tokio::test]
    async fn text_around_components_is_split() {
        let card = DrawnCard {
            card_name: "The Tower".into(),
            orientation: Orientation::Upright,
            arcana: None,
            suit: None,
            rank: None,
        };
        let canned = Canned(vec![
            ResponseEvent::text("Let me draw. ", "Let me draw. "),
            ResponseEvent::component(Component::card(card)),
            ResponseEvent::text("Upheaval.", "Let me draw. Upheaval."),
            ResponseEvent::done("Let me draw. Upheaval."),
        ]);
        let mut chat = ChatSession::new();
        let mut errors = ErrorHandler::default();

        TurnDriver::new(&mut chat, &mut errors)
            .run(&canned, "read", &mut |_| {})
            .await;

        let contents: Vec<&str> = chat.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["read", "Let me draw. ", "", "Upheaval."]);
    }

    #[tokio::test]
    async fn in_band_error_prefers_failure_notice() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(FailureNotice {
            provider: Provider::OpenRouter,
            error: ResponderError::Llm(LlmError::AuthFailed {
                provider: "openrouter".into(),
            }),
        })
        .unwrap();

        let canned = Canned(vec![ResponseEvent::error(
            "auth failed",
            Some(ErrorCode::InvalidApiKey),
        )]);
        let mut chat = ChatSession::new();
        let mut errors = ErrorHandler::default();

        let outcome = TurnDriver::new(&mut chat, &mut errors)
            .with_failures(&mut rx)
            .run(&canned, "hi", &mut |_| {})
            .await;

        assert!(matches!(outcome, TurnOutcome::Failed { kind: ErrorKind::ApiKeyInvalid, .. }));
        let record = errors.store().current().unwrap();
        assert_eq!(record.metadata["provider"], "openrouter");
        assert_eq!(chat.last().unwrap().error.as_deref(), Some("auth failed"));
    }

    #[tokio::test]
    async fn in_band_error_without_notice_uses_code() {
        let canned = Arc::new(Canned(vec![
            ResponseEvent::text("Hmm", "Hmm"),
            ResponseEvent::error("slow", Some(ErrorCode::Timeout)),
        ]));
        let mut chat = ChatSession::new();
        let mut errors = ErrorHandler::default();

        let outcome = TurnDriver::new(&mut chat, &mut errors)
            .run(canned.as_ref(), "hi", &mut |_| {})
            .await;

        assert!(matches!(outcome, TurnOutcome::Failed { kind: ErrorKind::LlmTimeout, .. }));
        assert_eq!(chat.len(), 2);
        assert_eq!(chat.last().unwrap().content, "Hmm");
    }
}
