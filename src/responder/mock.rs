//! Mock responder — simulates a streaming oracle without any network call.
//!
//! After a short "thinking" pause the input is matched against the command
//! table. Commands produce a single component, a streamed literal, or a
//! scripted failure; anything else gets one of the localized reply templates,
//! typed out one character at a time.

use std::time::Duration;

use async_trait::async_trait;
use futures::stream;
use rand::Rng;
use tracing::debug;

use crate::deck::{draw_forced_orientation, draw_single, draw_spread};
use crate::error::{ErrorCode, ResponderError};
use crate::locale::{Locale, Strings};
use crate::responder::command::{Command, Literal};
use crate::responder::event::{Component, ResponseEvent};
use crate::responder::{EventStream, Responder};

/// Timing knobs for the mock.
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Pause before the first event.
    pub thinking_delay: Duration,
    /// Pause between streamed characters.
    pub char_delay: Duration,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            thinking_delay: Duration::from_millis(1000),
            char_delay: Duration::from_millis(30),
        }
    }
}

impl MockConfig {
    /// No delays at all.
    pub fn instant() -> Self {
        Self {
            thinking_delay: Duration::ZERO,
            char_delay: Duration::ZERO,
        }
    }
}

/// Scripted, stateless responder for UI testing.
pub struct MockResponder {
    config: MockConfig,
    locale: Locale,
}

impl MockResponder {
    pub fn new(config: MockConfig, locale: Locale) -> Self {
        Self { config, locale }
    }

    pub fn set_locale(&mut self, locale: Locale) {
        self.locale = locale;
    }
}

#[async_trait]
impl Responder for MockResponder {
    fn name(&self) -> &str {
        "mock"
    }

    fn stream_response(&self, user_message: &str) -> EventStream {
        let config = self.config.clone();
        let strings = self.locale.strings();
        let start = Phase::Thinking(user_message.to_string());

        Box::pin(stream::unfold(start, move |phase| {
            advance(phase, config.clone(), strings)
        }))
    }
}

/// How a typed-out text ends.
enum Ending {
    Done,
    Fail(ResponderError),
}

enum Phase {
    Thinking(String),
    Typing {
        chars: std::vec::IntoIter<char>,
        buffer: String,
        ending: Ending,
        started: bool,
    },
    Emit(Result<ResponseEvent, ResponderError>),
    Finished,
}

impl Phase {
    fn typing(text: &str, ending: Ending) -> Self {
        Self::Typing {
            chars: text.chars().collect::<Vec<_>>().into_iter(),
            buffer: String::with_capacity(text.len()),
            ending,
            started: false,
        }
    }
}

type Step = Option<(Result<ResponseEvent, ResponderError>, Phase)>;

async fn advance(mut phase: Phase, config: MockConfig, strings: &'static Strings) -> Step {
    loop {
        match phase {
            Phase::Thinking(message) => {
                pause(config.thinking_delay).await;
                phase = plan(&message, strings);
            }
            Phase::Typing {
                mut chars,
                mut buffer,
                ending,
                started,
            } => {
                if started {
                    pause(config.char_delay).await;
                }
                return match chars.next() {
                    Some(c) => {
                        buffer.push(c);
                        let event = ResponseEvent::text(c.to_string(), buffer.clone());
                        let next = Phase::Typing {
                            chars,
                            buffer,
                            ending,
                            started: true,
                        };
                        Some((Ok(event), next))
                    }
                    None => match ending {
                        Ending::Done => Some((Ok(ResponseEvent::done(buffer)), Phase::Finished)),
                        Ending::Fail(err) => Some((Err(err), Phase::Finished)),
                    },
                };
            }
            Phase::Emit(item) => return Some((item, Phase::Finished)),
            Phase::Finished => return None,
        }
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// Decide what the response to `message` is. Runs once per stream.
fn plan(message: &str, strings: &'static Strings) -> Phase {
    let mut rng = rand::thread_rng();
    let command = Command::parse(message);
    debug!(command = ?command, "Mock responder dispatch");

    match command {
        Some(Command::Draw { deck }) => {
            let card = draw_single(deck.cards(), &mut rng);
            Phase::Emit(Ok(ResponseEvent::component(Component::card(card))))
        }
        Some(Command::DrawForced { deck, orientation }) => {
            let card = draw_forced_orientation(deck.cards(), orientation, &mut rng);
            Phase::Emit(Ok(ResponseEvent::component(Component::card(card))))
        }
        Some(Command::Spread { kind, deck }) => {
            let cards = draw_spread(kind, deck.cards(), &mut rng);
            Phase::Emit(Ok(ResponseEvent::component(Component::spread(kind, cards))))
        }
        Some(Command::Deck { mode, count }) => {
            Phase::Emit(Ok(ResponseEvent::component(Component::deck(mode, count))))
        }
        Some(Command::Literal(Literal::Help)) => Phase::typing(strings.help, Ending::Done),
        Some(Command::Literal(Literal::MarkdownDemo)) => {
            Phase::typing(strings.markdown_demo, Ending::Done)
        }
        Some(Command::Fail { code, partial }) => {
            let err = ResponderError::simulated(code, failure_text(code, strings));
            if partial {
                Phase::typing(strings.stream_prefix, Ending::Fail(err))
            } else {
                Phase::Emit(Err(err))
            }
        }
        None => {
            let template = strings.responses[rng.gen_range(0..strings.responses.len())];
            Phase::typing(&template.replace("{query}", message), Ending::Done)
        }
    }
}

fn failure_text(code: ErrorCode, strings: &Strings) -> &'static str {
    let errors = &strings.errors;
    match code {
        ErrorCode::MysticalError => errors.mystical,
        ErrorCode::NetworkError => errors.network,
        ErrorCode::Timeout => errors.timeout,
        ErrorCode::StreamingError => errors.streaming,
        ErrorCode::RateLimit => errors.rate_limit,
        _ => errors.generic,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use futures::StreamExt;

    use super::*;
    use crate::deck::{Orientation, full_deck, major_arcana};

    fn responder() -> MockResponder {
        MockResponder::new(MockConfig::instant(), Locale::En)
    }

    async fn collect(
        responder: &MockResponder,
        input: &str,
    ) -> Vec<Result<ResponseEvent, ResponderError>> {
        responder.stream_response(input).collect().await
    }

    fn only_component(items: Vec<Result<ResponseEvent, ResponderError>>) -> Component {
        assert_eq!(items.len(), 1, "expected exactly one event");
        match items.into_iter().next() {
            Some(Ok(ResponseEvent::Component(c))) => c,
            other => panic!("expected a component event, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn draw_yields_one_full_deck_card() {
        let component = only_component(collect(&responder(), "/draw").await);
        assert_eq!(component.name(), "TarotCard");
        let Component::TarotCard(view) = component else {
            panic!("not a card");
        };
        assert!(full_deck().iter().any(|c| c.name == view.card.card_name));
        assert!(view.is_revealed);
    }

    #[tokio::test]
    async fn spread_yields_three_distinct_cards() {
        let component = only_component(collect(&responder(), "/spread").await);
        assert_eq!(component.name(), "TarotSpread");
        let data = component.data();
        let cards = data["cards"].as_array().unwrap();
        assert_eq!(cards.len(), 3);
        let names: HashSet<&str> = cards.iter().map(|c| c["cardName"].as_str().unwrap()).collect();
        assert_eq!(names.len(), 3);
        assert_eq!(data["spreadType"], "three-card");
    }

    #[tokio::test]
    async fn celtic_major_draws_ten_majors() {
        let component = only_component(collect(&responder(), "/celtic-major").await);
        let Component::TarotSpread(view) = component else {
            panic!("not a spread");
        };
        assert_eq!(view.cards.len(), 10);
        assert!(
            view.cards
                .iter()
                .all(|d| major_arcana().iter().any(|c| c.name == d.card_name))
        );
    }

    #[tokio::test]
    async fn draw_reversed_is_reversed() {
        for _ in 0..20 {
            let component = only_component(collect(&responder(), "/draw-reversed").await);
            let Component::TarotCard(view) = component else {
                panic!("not a card");
            };
            assert_eq!(view.card.orientation, Orientation::Reversed);
        }
    }

    #[tokio::test]
    async fn deck_multiple_asks_for_three() {
        let component = only_component(collect(&responder(), "/deck-multiple").await);
        assert_eq!(component.data(), serde_json::json!({"mode": "multiple", "count": 3}));
    }

    #[tokio::test]
    async fn error_stream_streams_prefix_then_fails() {
        let items = collect(&responder(), "/error-stream").await;
        let (last, texts) = items.split_last().unwrap();

        let mut rebuilt = String::new();
        for item in texts {
            match item {
                Ok(ResponseEvent::Text { chunk, full_text }) => {
                    rebuilt.push_str(chunk);
                    assert_eq!(&rebuilt, full_text);
                }
                other => panic!("unexpected item {:?}", other),
            }
        }
        assert!(!texts.is_empty());
        assert_eq!(rebuilt, "The cards reveal...");

        match last {
            Err(err) => assert_eq!(err.code(), Some(ErrorCode::StreamingError)),
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn plain_errors_fail_immediately() {
        for (input, code) in [
            ("/error", ErrorCode::MysticalError),
            ("/error-network", ErrorCode::NetworkError),
            ("/error-timeout", ErrorCode::Timeout),
            ("/error-rate-limit", ErrorCode::RateLimit),
        ] {
            let items = collect(&responder(), input).await;
            assert_eq!(items.len(), 1, "{}", input);
            let err = items.into_iter().next().unwrap().unwrap_err();
            assert!(err.is_simulated());
            assert_eq!(err.code(), Some(code));
        }
    }

    #[tokio::test]
    async fn free_text_streams_a_template() {
        let items = collect(&responder(), "hello world").await;
        let (last, texts) = items.split_last().unwrap();

        let concatenated: String = texts
            .iter()
            .map(|item| match item {
                Ok(ResponseEvent::Text { chunk, .. }) => chunk.clone(),
                other => panic!("unexpected item {:?}", other),
            })
            .collect();

        let expected: Vec<String> = Locale::En
            .strings()
            .responses
            .iter()
            .map(|t| t.replace("{query}", "hello world"))
            .collect();
        assert!(expected.contains(&concatenated));

        match last {
            Ok(ResponseEvent::Done { full_text }) => assert_eq!(full_text, &concatenated),
            other => panic!("expected done, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn localized_templates() {
        let mock = MockResponder::new(MockConfig::instant(), Locale::ZhTw);
        let text = mock.send_message("愛情").await.unwrap();
        assert!(text.contains("「愛情」"));
    }

    #[tokio::test]
    async fn markdown_demo_streams_to_done() {
        let items = collect(&responder(), "/MD").await;
        match items.last() {
            Some(Ok(ResponseEvent::Done { full_text })) => {
                assert_eq!(full_text, Locale::En.strings().markdown_demo);
            }
            other => panic!("expected done, got {:?}", other),
        }
        assert_eq!(items.len(), Locale::En.strings().markdown_demo.chars().count() + 1);
    }

    #[tokio::test]
    async fn send_message_propagates_simulated_errors() {
        let err = responder().send_message("/error-timeout").await.unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::Timeout));
    }

    #[tokio::test(start_paused = true)]
    async fn delays_are_observed() {
        let mock = MockResponder::new(
            MockConfig {
                thinking_delay: Duration::from_millis(1000),
                char_delay: Duration::from_millis(30),
            },
            Locale::En,
        );
        let start = tokio::time::Instant::now();
        let mut stream = mock.stream_response("/error-stream");

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first, ResponseEvent::text("T", "T"));
        assert_eq!(start.elapsed(), Duration::from_millis(1000));

        stream.next().await.unwrap().unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(1030));
    }

    #[tokio::test]
    async fn each_call_is_a_fresh_stream() {
        let mock = responder();
        let a: Vec<_> = mock.stream_response("/help").collect().await;
        let b: Vec<_> = mock.stream_response("/help").collect().await;
        assert_eq!(a.len(), b.len());
    }
}
