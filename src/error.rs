//! Error types for the tarot oracle.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use crate::tools::ToolError;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Component error: {0}")]
    Component(#[from] ComponentError),

    #[error("Responder error: {0}")]
    Responder(#[from] ResponderError),
}

/// Machine-readable failure codes carried alongside error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    MysticalError,
    NetworkError,
    Timeout,
    StreamingError,
    RateLimit,
    InvalidApiKey,
    MissingApiKey,
    InvalidResponse,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MysticalError => "MYSTICAL_ERROR",
            Self::NetworkError => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::StreamingError => "STREAMING_ERROR",
            Self::RateLimit => "RATE_LIMIT",
            Self::InvalidApiKey => "INVALID_API_KEY",
            Self::MissingApiKey => "MISSING_API_KEY",
            Self::InvalidResponse => "INVALID_RESPONSE",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} rate limited, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Provider {provider} network error: {reason}")]
    Network { provider: String, reason: String },

    #[error("Provider {provider} request timeout: {reason}")]
    Timeout { provider: String, reason: String },

    #[error("Provider {provider} streaming interrupted: {reason}")]
    StreamInterrupted { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}: invalid API key")]
    AuthFailed { provider: String },

    #[error("Unsupported provider for {operation}: {provider}")]
    Unsupported { provider: String, operation: String },

    #[error("Agent stopped after {max} tool iterations without a final answer")]
    IterationLimit { max: usize },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LlmError {
    /// Failure code for classification, if this error maps to one.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::RateLimited { .. } => Some(ErrorCode::RateLimit),
            Self::Network { .. } => Some(ErrorCode::NetworkError),
            Self::Timeout { .. } => Some(ErrorCode::Timeout),
            Self::StreamInterrupted { .. } => Some(ErrorCode::StreamingError),
            Self::InvalidResponse { .. } | Self::Json(_) => Some(ErrorCode::InvalidResponse),
            Self::AuthFailed { .. } => Some(ErrorCode::InvalidApiKey),
            _ => None,
        }
    }
}

/// Invalid component payload (unknown name or malformed data).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid component {component}: {}", problems.join("; "))]
pub struct ComponentError {
    pub component: String,
    pub problems: Vec<String>,
}

/// Failure of a single responder invocation.
///
/// `Simulated` is the mock responder's expected, scripted failure and always
/// carries a code. The other variants are genuine runtime failures.
#[derive(Debug, thiserror::Error)]
pub enum ResponderError {
    #[error("{message}")]
    Simulated { code: ErrorCode, message: String },

    /// A failure a responder already reported in-band as an `Error` event.
    #[error("{message}")]
    Reported {
        message: String,
        code: Option<ErrorCode>,
    },

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Tool output that could not be turned into a component.
    #[error(transparent)]
    Component(#[from] ComponentError),
}

impl ResponderError {
    pub fn simulated(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Simulated {
            code,
            message: message.into(),
        }
    }

    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Simulated { code, .. } => Some(*code),
            Self::Reported { code, .. } => *code,
            Self::Llm(e) => e.code(),
            Self::Tool(_) => None,
            Self::Config(ConfigError::MissingRequired { key, .. }) if key == "api_key" => {
                Some(ErrorCode::MissingApiKey)
            }
            Self::Config(_) | Self::Component(_) => None,
        }
    }

    pub fn is_simulated(&self) -> bool {
        matches!(self, Self::Simulated { .. })
    }
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
