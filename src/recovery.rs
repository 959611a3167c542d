//! Error classification, notices, and retry with exponential backoff.
//!
//! Raw failures are reduced to a [`Failure`] (code, name, message) and then
//! classified into an [`ErrorKind`]: explicit code first, then error name,
//! then case-insensitive message substrings, then `UNKNOWN_ERROR`.

use std::future::Future;
use std::time::Duration;

use serde_json::{Map, json};
use tracing::{info, warn};

use crate::error::{
    ComponentError, ConfigError, Error, ErrorCode, LlmError, ResponderError, ToolError,
};
use crate::llm::Provider;
use crate::store::{ErrorKind, ErrorStore};

/// Default attempt budget for retries.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Base delay doubled after every failed attempt.
const BACKOFF_BASE: Duration = Duration::from_millis(1000);

/// Rate-limit cooldown assumed when the provider gives none, in seconds.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// What the classifier looks at.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Failure {
    pub code: Option<ErrorCode>,
    pub name: Option<String>,
    pub message: String,
    pub retry_after: Option<Duration>,
}

impl Failure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Errors that can describe themselves to the classifier.
pub trait Classify {
    fn failure(&self) -> Failure;
}

impl Classify for Failure {
    fn failure(&self) -> Failure {
        self.clone()
    }
}

impl Classify for LlmError {
    fn failure(&self) -> Failure {
        let mut failure = Failure::new(self.to_string());
        failure.code = self.code();
        if let LlmError::Network { .. } = self {
            failure.name = Some("NetworkError".to_string());
        }
        if let LlmError::RateLimited { retry_after, .. } = self {
            failure.retry_after = *retry_after;
        }
        failure
    }
}

impl Classify for ToolError {
    fn failure(&self) -> Failure {
        Failure::new(self.to_string()).with_name("TarotDrawError")
    }
}

impl Classify for ComponentError {
    fn failure(&self) -> Failure {
        Failure::new(self.to_string()).with_name("ComponentError")
    }
}

impl Classify for ConfigError {
    fn failure(&self) -> Failure {
        let failure = Failure::new(self.to_string());
        match self {
            ConfigError::MissingRequired { key, .. } if key == "api_key" => {
                failure.with_code(ErrorCode::MissingApiKey)
            }
            _ => failure.with_name("ValidationError"),
        }
    }
}

impl Classify for ResponderError {
    fn failure(&self) -> Failure {
        match self {
            ResponderError::Llm(e) => e.failure(),
            ResponderError::Tool(e) => e.failure(),
            ResponderError::Config(e) => e.failure(),
            ResponderError::Component(e) => e.failure(),
            ResponderError::Simulated { .. } | ResponderError::Reported { .. } => Failure {
                code: self.code(),
                ..Failure::new(self.to_string())
            },
        }
    }
}

impl Classify for Error {
    fn failure(&self) -> Failure {
        match self {
            Error::Config(e) => e.failure(),
            Error::Llm(e) => e.failure(),
            Error::Tool(e) => e.failure(),
            Error::Component(e) => e.failure(),
            Error::Responder(e) => e.failure(),
        }
    }
}

/// Map a failure to its catalog kind.
pub fn classify(failure: &Failure) -> ErrorKind {
    if let Some(code) = failure.code {
        return match code {
            ErrorCode::InvalidApiKey => ErrorKind::ApiKeyInvalid,
            ErrorCode::MissingApiKey => ErrorKind::ApiKeyMissing,
            ErrorCode::RateLimit => ErrorKind::RateLimit,
            ErrorCode::NetworkError => ErrorKind::NetworkError,
            ErrorCode::Timeout => ErrorKind::LlmTimeout,
            ErrorCode::StreamingError => ErrorKind::LlmStreamingError,
            ErrorCode::MysticalError => ErrorKind::MockMysticalError,
            ErrorCode::InvalidResponse => ErrorKind::LlmInvalidResponse,
        };
    }

    match failure.name.as_deref() {
        Some("NetworkError") => return ErrorKind::NetworkError,
        Some("ValidationError") => return ErrorKind::ValidationError,
        Some("ComponentError") => return ErrorKind::ComponentLoadError,
        Some("TarotDrawError") => return ErrorKind::TarotDrawError,
        _ => {}
    }

    let message = failure.message.to_lowercase();
    const PATTERNS: [(&str, ErrorKind); 6] = [
        ("api key", ErrorKind::ApiKeyInvalid),
        ("rate limit", ErrorKind::RateLimit),
        ("network", ErrorKind::NetworkError),
        ("timeout", ErrorKind::LlmTimeout),
        ("streaming", ErrorKind::LlmStreamingError),
        ("mystical", ErrorKind::MockMysticalError),
    ];
    PATTERNS
        .iter()
        .find(|(needle, _)| message.contains(needle))
        .map(|(_, kind)| *kind)
        .unwrap_or(ErrorKind::UnknownError)
}

/// Options for [`ErrorHandler::with_error_handling`].
#[derive(Debug, Clone, Copy)]
pub struct HandlingOptions {
    /// Skip the notice on failure.
    pub silent: bool,
    /// Retry with backoff before giving up.
    pub retry: bool,
    pub max_retries: u32,
}

impl Default for HandlingOptions {
    fn default() -> Self {
        Self {
            silent: false,
            retry: false,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

/// Classifies failures into the error store and runs retry loops.
#[derive(Debug, Default)]
pub struct ErrorHandler {
    store: ErrorStore,
    provider: Option<Provider>,
}

impl ErrorHandler {
    pub fn new(store: ErrorStore) -> Self {
        Self {
            store,
            provider: None,
        }
    }

    /// Provider named in credential notices.
    pub fn set_provider(&mut self, provider: Provider) {
        self.provider = Some(provider);
    }

    pub fn store(&self) -> &ErrorStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ErrorStore {
        &mut self.store
    }

    /// Classify `err` and show the matching notice.
    pub fn handle_llm_error(&mut self, err: &dyn Classify) -> ErrorKind {
        let failure = err.failure();
        let kind = classify(&failure);
        warn!(kind = %kind, error = %failure.message, "Handling failure");

        let mut metadata = Map::new();
        let mut custom_message = None;
        match kind {
            ErrorKind::ApiKeyInvalid | ErrorKind::ApiKeyMissing => {
                if let Some(provider) = self.provider {
                    metadata.insert("provider".into(), json!(provider.as_str()));
                }
                metadata.insert("detail".into(), json!(failure.message));
            }
            ErrorKind::RateLimit => {
                let retry_after = failure
                    .retry_after
                    .map(|d| d.as_secs())
                    .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
                metadata.insert("retryAfter".into(), json!(retry_after));
                metadata.insert("requestsRemaining".into(), json!(0));
            }
            ErrorKind::MockMysticalError => {
                custom_message = Some(failure.message.clone());
            }
            ErrorKind::UnknownError => {
                custom_message = Some(failure.message.clone());
                if let Some(name) = &failure.name {
                    metadata.insert("name".into(), json!(name));
                }
            }
            _ => {
                metadata.insert("detail".into(), json!(failure.message));
            }
        }
        if let Some(code) = failure.code {
            metadata.insert("code".into(), json!(code.as_str()));
        }

        self.store.show_error(kind, custom_message, metadata);
        kind
    }

    /// Show the welcome notice asking for provider setup.
    pub fn handle_api_key_missing(&mut self) {
        self.store.show_error(ErrorKind::ApiKeyMissing, None, Map::new());
    }

    /// Run `op` up to `max_attempts` times (0 counts as 1).
    ///
    /// After failed attempt `i` (0-based) that is not the last, waits
    /// `2^i` seconds. Every failure bumps the store's retry counter and a
    /// success resets it. The last error is returned unchanged.
    pub async fn retry_with_backoff<T, E, F, Fut>(
        &mut self,
        mut op: F,
        max_attempts: u32,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let attempts = max_attempts.max(1);
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => {
                    self.store.reset_retry_count();
                    return Ok(value);
                }
                Err(e) => {
                    self.store.increment_retry_count();
                    if attempt + 1 >= attempts {
                        return Err(e);
                    }
                    let delay = backoff_delay(attempt);
                    info!(
                        error = %e,
                        "Retry {}/{} after {}ms",
                        attempt + 1,
                        attempts,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Run `op`, optionally with retries, and show a notice if it still fails.
    pub async fn with_error_handling<T, E, F, Fut>(
        &mut self,
        mut op: F,
        options: HandlingOptions,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + std::fmt::Display,
    {
        let result = if options.retry {
            self.retry_with_backoff(op, options.max_retries).await
        } else {
            op().await
        };

        if let Err(ref e) = result
            && !options.silent
        {
            self.handle_llm_error(e);
        }
        result
    }
}

/// Delay before retry number `attempt + 1`: one second, doubling each time.
/// Saturates at `Duration::MAX` instead of overflowing.
fn backoff_delay(attempt: u32) -> Duration {
    2u32.checked_pow(attempt)
        .and_then(|factor| BACKOFF_BASE.checked_mul(factor))
        .unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use tokio::time::Instant;

    use super::*;

    #[test]
    fn code_wins_over_message() {
        let failure = Failure::new("network hiccup while streaming").with_code(ErrorCode::Timeout);
        assert_eq!(classify(&failure), ErrorKind::LlmTimeout);
    }

    #[test]
    fn name_wins_over_message() {
        let failure = Failure::new("rate limit exceeded").with_name("NetworkError");
        assert_eq!(classify(&failure), ErrorKind::NetworkError);
    }

    #[test]
    fn substrings_are_case_insensitive_and_ordered() {
        let cases = [
            ("Your API Key was rejected", ErrorKind::ApiKeyInvalid),
            ("Rate Limit hit (network busy)", ErrorKind::RateLimit),
            ("NETWORK unreachable", ErrorKind::NetworkError),
            ("request Timeout", ErrorKind::LlmTimeout),
            ("streaming broke", ErrorKind::LlmStreamingError),
            ("mystical forces", ErrorKind::MockMysticalError),
            ("something else", ErrorKind::UnknownError),
        ];
        for (message, expected) in cases {
            assert_eq!(classify(&Failure::new(message)), expected, "{}", message);
        }
    }

    #[test]
    fn every_code_has_a_kind() {
        let pairs = [
            (ErrorCode::InvalidApiKey, ErrorKind::ApiKeyInvalid),
            (ErrorCode::MissingApiKey, ErrorKind::ApiKeyMissing),
            (ErrorCode::RateLimit, ErrorKind::RateLimit),
            (ErrorCode::NetworkError, ErrorKind::NetworkError),
            (ErrorCode::StreamingError, ErrorKind::LlmStreamingError),
            (ErrorCode::MysticalError, ErrorKind::MockMysticalError),
            (ErrorCode::InvalidResponse, ErrorKind::LlmInvalidResponse),
        ];
        for (code, kind) in pairs {
            assert_eq!(classify(&Failure::new("").with_code(code)), kind);
        }
    }

    #[test]
    fn typed_errors_describe_themselves() {
        let err: ResponderError = ConfigError::MissingRequired {
            key: "api_key".into(),
            hint: "configure it".into(),
        }
        .into();
        assert_eq!(classify(&err.failure()), ErrorKind::ApiKeyMissing);

        let err = ToolError::InvalidParameters("deckType".into());
        assert_eq!(classify(&err.failure()), ErrorKind::TarotDrawError);

        let err = ComponentError {
            component: "TarotCard".into(),
            problems: vec!["TarotCard requires cardName".into()],
        };
        assert_eq!(classify(&err.failure()), ErrorKind::ComponentLoadError);

        let err: ResponderError = err.into();
        assert_eq!(err.code(), None);
        assert_eq!(classify(&err.failure()), ErrorKind::ComponentLoadError);

        let err = LlmError::Network {
            provider: "gemini".into(),
            reason: "dns".into(),
        };
        assert_eq!(classify(&err.failure()), ErrorKind::NetworkError);
    }

    #[test]
    fn rate_limit_metadata() {
        let mut handler = ErrorHandler::default();
        let kind = handler.handle_llm_error(&ResponderError::simulated(
            ErrorCode::RateLimit,
            "slow down",
        ));
        assert_eq!(kind, ErrorKind::RateLimit);

        let record = handler.store().current().unwrap();
        assert_eq!(record.metadata["retryAfter"], 60);
        assert_eq!(record.metadata["requestsRemaining"], 0);
        assert_eq!(
            record.message,
            "You've exceeded the API rate limit. Please wait before trying again."
        );
    }

    #[test]
    fn key_errors_carry_provider() {
        let mut handler = ErrorHandler::default();
        handler.set_provider(Provider::Groq);
        handler.handle_llm_error(&LlmError::AuthFailed {
            provider: "groq".into(),
        });
        let record = handler.store().current().unwrap();
        assert_eq!(record.kind, ErrorKind::ApiKeyInvalid);
        assert_eq!(record.metadata["provider"], "groq");
    }

    #[test]
    fn mystical_and_unknown_keep_raw_message() {
        let mut handler = ErrorHandler::default();
        handler.handle_llm_error(&ResponderError::simulated(
            ErrorCode::MysticalError,
            "The stars are clouded",
        ));
        assert_eq!(handler.store().current().unwrap().message, "The stars are clouded");

        handler.handle_llm_error(&Failure::new("disk on fire"));
        let record = handler.store().current().unwrap();
        assert_eq!(record.kind, ErrorKind::UnknownError);
        assert_eq!(record.message, "disk on fire");
    }

    #[test]
    fn api_key_missing_notice() {
        let mut handler = ErrorHandler::default();
        handler.handle_api_key_missing();
        assert_eq!(handler.store().current().unwrap().kind, ErrorKind::ApiKeyMissing);
        assert!(handler.store().is_modal_open());
    }

    #[tokio::test(start_paused = true)]
    async fn retry_recovers_after_two_failures() {
        let mut handler = ErrorHandler::default();
        let calls = Arc::new(AtomicU32::new(0));
        let start = Instant::now();

        let counter = Arc::clone(&calls);
        let result: Result<&str, Failure> = handler
            .retry_with_backoff(
                move || {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    async move {
                        if n < 2 {
                            Err(Failure::new("network down"))
                        } else {
                            Ok("answer")
                        }
                    }
                },
                3,
            )
            .await;

        assert_eq!(result.unwrap(), "answer");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(handler.store().retry_count(), 0);
        assert_eq!(start.elapsed(), Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn retry_gives_up_with_last_error() {
        let mut handler = ErrorHandler::default();
        let calls = Arc::new(AtomicU32::new(0));
        let start = Instant::now();

        let counter = Arc::clone(&calls);
        let result: Result<(), Failure> = handler
            .retry_with_backoff(
                move || {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    async move { Err(Failure::new(format!("failure {}", n))) }
                },
                2,
            )
            .await;

        assert_eq!(result.unwrap_err().message, "failure 1");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(handler.store().retry_count(), 2);
        assert_eq!(start.elapsed(), Duration::from_millis(1000));
    }

    #[test]
    fn backoff_doubles_then_saturates() {
        assert_eq!(backoff_delay(0), Duration::from_secs(1));
        assert_eq!(backoff_delay(3), Duration::from_secs(8));
        assert_eq!(backoff_delay(31), Duration::from_secs(1 << 31));
        assert_eq!(backoff_delay(32), Duration::MAX);
        assert_eq!(backoff_delay(u32::MAX), Duration::MAX);
    }

    #[tokio::test(start_paused = true)]
    async fn many_attempts_do_not_overflow_the_delay() {
        let mut handler = ErrorHandler::default();
        let calls = Arc::new(AtomicU32::new(0));

        let counter = Arc::clone(&calls);
        let result: Result<(), Failure> = handler
            .retry_with_backoff(
                move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async { Err(Failure::new("down")) }
                },
                40,
            )
            .await;

        assert_eq!(result.unwrap_err().message, "down");
        assert_eq!(calls.load(Ordering::SeqCst), 40);
        assert_eq!(handler.store().retry_count(), 40);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_attempts_means_one() {
        let mut handler = ErrorHandler::default();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let result: Result<(), Failure> = handler
            .retry_with_backoff(
                move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async { Err(Failure::new("nope")) }
                },
                0,
            )
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn with_error_handling_shows_unless_silent() {
        let mut handler = ErrorHandler::default();

        let result: Result<(), ResponderError> = handler
            .with_error_handling(
                || async { Err(ResponderError::simulated(ErrorCode::Timeout, "too slow")) },
                HandlingOptions {
                    silent: true,
                    ..Default::default()
                },
            )
            .await;
        assert!(result.is_err());
        assert!(!handler.store().has_active_error());

        let result: Result<(), ResponderError> = handler
            .with_error_handling(
                || async { Err(ResponderError::simulated(ErrorCode::Timeout, "too slow")) },
                HandlingOptions::default(),
            )
            .await;
        assert_eq!(result.unwrap_err().code(), Some(ErrorCode::Timeout));
        assert_eq!(handler.store().current().unwrap().kind, ErrorKind::LlmTimeout);
    }

    #[tokio::test(start_paused = true)]
    async fn with_error_handling_retries_when_asked() {
        let mut handler = ErrorHandler::default();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result: Result<u32, Failure> = handler
            .with_error_handling(
                move || {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    async move { if n == 0 { Err(Failure::new("blip")) } else { Ok(n) } }
                },
                HandlingOptions {
                    retry: true,
                    ..Default::default()
                },
            )
            .await;
        assert_eq!(result.unwrap(), 1);
        assert!(!handler.store().has_active_error());
    }
}
