//! End-to-end flows: responder → turn driver → chat and error stores.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::mpsc;
use tokio::time::timeout;

use tarot_oracle::error::LlmError;
use tarot_oracle::llm::provider::{
    CompletionRequest, CompletionResponse, FinishReason, LlmProvider, ToolCall,
    ToolCompletionRequest, ToolCompletionResponse,
};
use tarot_oracle::locale::Locale;
use tarot_oracle::recovery::ErrorHandler;
use tarot_oracle::responder::{
    Component, LlmResponder, LlmResponderConfig, MockConfig, MockResponder, ResponseEvent,
};
use tarot_oracle::store::{ChatSession, ErrorKind};
use tarot_oracle::turn::{TurnDriver, TurnOutcome};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Stub LLM: asks for a three-card spread, then answers in text.
struct StubLlm {
    calls: AtomicUsize,
}

impl StubLlm {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl LlmProvider for StubLlm {
    fn model_name(&self) -> &str {
        "stub"
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        unimplemented!("not used in oracle flow tests")
    }

    async fn complete_with_tools(
        &self,
        _request: ToolCompletionRequest,
    ) -> Result<ToolCompletionResponse, LlmError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let response = if call == 0 {
            ToolCompletionResponse {
                content: Some("Let me lay out the cards. ".to_string()),
                tool_calls: vec![ToolCall {
                    id: "call_1".to_string(),
                    name: "draw_three_card_spread".to_string(),
                    arguments: json!({"deckType": "major"}),
                }],
                input_tokens: 10,
                output_tokens: 5,
                finish_reason: FinishReason::ToolUse,
                response_id: None,
            }
        } else {
            ToolCompletionResponse {
                content: Some("Past, present and future align.".to_string()),
                tool_calls: Vec::new(),
                input_tokens: 20,
                output_tokens: 8,
                finish_reason: FinishReason::Stop,
                response_id: None,
            }
        };
        Ok(response)
    }
}

/// Stub LLM that always hits a rate limit.
struct RateLimitedLlm;

#[async_trait]
impl LlmProvider for RateLimitedLlm {
    fn model_name(&self) -> &str {
        "limited"
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        unimplemented!("not used in oracle flow tests")
    }

    async fn complete_with_tools(
        &self,
        _request: ToolCompletionRequest,
    ) -> Result<ToolCompletionResponse, LlmError> {
        Err(LlmError::RateLimited {
            provider: "groq".to_string(),
            retry_after: Some(Duration::from_secs(30)),
        })
    }
}

#[tokio::test]
async fn mock_session_accumulates_turns() {
    let responder = MockResponder::new(MockConfig::instant(), Locale::En);
    let mut chat = ChatSession::new();
    let mut errors = ErrorHandler::default();

    for input in ["/draw", "/spread", "/deck-multiple", "hello world"] {
        let outcome = timeout(
            TEST_TIMEOUT,
            TurnDriver::new(&mut chat, &mut errors).run(&responder, input, &mut |_| {}),
        )
        .await
        .expect("turn hung");
        assert!(matches!(outcome, TurnOutcome::Completed { .. }), "{input}");
    }

    // user + one message per turn
    assert_eq!(chat.len(), 8);
    let components: Vec<&str> = chat
        .messages()
        .iter()
        .filter_map(|m| m.component.as_ref().map(Component::name))
        .collect();
    assert_eq!(components, vec!["TarotCard", "TarotSpread", "TarotDeck"]);

    let last = chat.last().unwrap();
    assert!(last.content.contains("hello world"));
    assert!(!last.streaming);
    assert!(!errors.store().has_active_error());
}

#[tokio::test]
async fn mock_failures_fill_error_history() {
    let responder = MockResponder::new(MockConfig::instant(), Locale::En);
    let mut chat = ChatSession::new();
    let mut errors = ErrorHandler::default();

    let inputs = [
        ("/error", ErrorKind::MockMysticalError),
        ("/error-network", ErrorKind::NetworkError),
        ("/error-timeout", ErrorKind::LlmTimeout),
        ("/error-stream", ErrorKind::LlmStreamingError),
        ("/error-rate-limit", ErrorKind::RateLimit),
    ];
    for (input, expected) in inputs {
        let outcome = TurnDriver::new(&mut chat, &mut errors)
            .run(&responder, input, &mut |_| {})
            .await;
        match outcome {
            TurnOutcome::Failed { kind, .. } => assert_eq!(kind, expected, "{input}"),
            other => panic!("{input}: expected failure, got {:?}", other),
        }
    }

    let recent: Vec<ErrorKind> = errors.store().recent_errors().map(|r| r.kind).collect();
    assert_eq!(recent.len(), 5);
    assert_eq!(recent[0], ErrorKind::RateLimit);
    assert_eq!(recent[4], ErrorKind::MockMysticalError);
}

#[tokio::test]
async fn llm_turn_streams_text_and_spread() {
    let responder = LlmResponder::new(LlmResponderConfig::default())
        .with_provider(Arc::new(StubLlm::new()));
    let mut chat = ChatSession::new();
    let mut errors = ErrorHandler::default();
    let mut events = Vec::new();

    let outcome = timeout(
        TEST_TIMEOUT,
        TurnDriver::new(&mut chat, &mut errors).run(
            &responder,
            "What does my week hold?",
            &mut |e: &ResponseEvent| events.push(e.clone()),
        ),
    )
    .await
    .expect("turn hung");

    let full = "Let me lay out the cards. Past, present and future align.";
    assert_eq!(outcome, TurnOutcome::Completed { text: full.to_string() });
    assert!(matches!(events.last(), Some(ResponseEvent::Done { .. })));

    let contents: Vec<&str> = chat.messages().iter().map(|m| m.content.as_str()).collect();
    assert_eq!(
        contents,
        vec![
            "What does my week hold?",
            "Let me lay out the cards. ",
            "",
            "Past, present and future align."
        ]
    );
    match &chat.messages()[2].component {
        Some(Component::TarotSpread(view)) => assert_eq!(view.cards.len(), 3),
        other => panic!("expected spread, got {:?}", other),
    }

    let history = responder.history().await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].content, full);
}

#[tokio::test]
async fn llm_failure_reaches_error_store_with_notice() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let responder = LlmResponder::new(LlmResponderConfig::default())
        .with_provider(Arc::new(RateLimitedLlm))
        .with_failure_channel(tx);
    let mut chat = ChatSession::new();
    let mut errors = ErrorHandler::default();

    let outcome = timeout(
        TEST_TIMEOUT,
        TurnDriver::new(&mut chat, &mut errors)
            .with_failures(&mut rx)
            .run(&responder, "Will it rain?", &mut |_| {}),
    )
    .await
    .expect("turn hung");

    assert!(matches!(outcome, TurnOutcome::Failed { kind: ErrorKind::RateLimit, .. }));
    let record = errors.store().current().unwrap();
    assert_eq!(record.metadata["retryAfter"], 30);
    assert!(errors.store().is_modal_open());
    assert!(chat.last().unwrap().error.is_some());
    assert!(responder.history().await.is_empty());
}
