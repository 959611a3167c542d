//! ErrorStore — error catalog, the current error notice, and recent history.
//!
//! The catalog maps each [`ErrorKind`] to a static [`ErrorProfile`]
//! describing how the notice reads and looks. The store itself is plain
//! state owned by the UI loop.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

/// Most recent errors kept in history.
pub const ERROR_HISTORY_CAPACITY: usize = 10;

/// Automatic retries allowed before `can_retry` turns false.
pub const MAX_AUTO_RETRIES: u32 = 2;

/// Classified failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    ApiKeyInvalid,
    ApiKeyMissing,
    NetworkError,
    RateLimit,
    LlmTimeout,
    LlmStreamingError,
    LlmInvalidResponse,
    ValidationError,
    ComponentLoadError,
    TarotDrawError,
    MockMysticalError,
    UnknownError,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 12] = [
        ErrorKind::ApiKeyInvalid,
        ErrorKind::ApiKeyMissing,
        ErrorKind::NetworkError,
        ErrorKind::RateLimit,
        ErrorKind::LlmTimeout,
        ErrorKind::LlmStreamingError,
        ErrorKind::LlmInvalidResponse,
        ErrorKind::ValidationError,
        ErrorKind::ComponentLoadError,
        ErrorKind::TarotDrawError,
        ErrorKind::MockMysticalError,
        ErrorKind::UnknownError,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApiKeyInvalid => "API_KEY_INVALID",
            Self::ApiKeyMissing => "API_KEY_MISSING",
            Self::NetworkError => "NETWORK_ERROR",
            Self::RateLimit => "RATE_LIMIT",
            Self::LlmTimeout => "LLM_TIMEOUT",
            Self::LlmStreamingError => "LLM_STREAMING_ERROR",
            Self::LlmInvalidResponse => "LLM_INVALID_RESPONSE",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::ComponentLoadError => "COMPONENT_LOAD_ERROR",
            Self::TarotDrawError => "TAROT_DRAW_ERROR",
            Self::MockMysticalError => "MOCK_MYSTICAL_ERROR",
            Self::UnknownError => "UNKNOWN_ERROR",
        }
    }

    pub fn profile(&self) -> &'static ErrorProfile {
        profile(*self)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Buttons an error notice can offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Reconfigure,
    Configure,
    Retry,
    Wait,
    Report,
    Refresh,
    Dismiss,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reconfigure => "reconfigure",
            Self::Configure => "configure",
            Self::Retry => "retry",
            Self::Wait => "wait",
            Self::Report => "report",
            Self::Refresh => "refresh",
            Self::Dismiss => "dismiss",
        }
    }
}

/// Visual treatment of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Presentation {
    pub primary_color: &'static str,
    pub glow_color: &'static str,
    pub border_style: &'static str,
    pub icon_animation: &'static str,
}

/// Static description of one error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ErrorProfile {
    pub severity: Severity,
    pub icon: &'static str,
    pub title: &'static str,
    pub default_message: &'static str,
    pub actions: &'static [Action],
    pub primary_action: Option<Action>,
    pub retryable: bool,
    pub show_cooldown: bool,
    pub suggestions: &'static [&'static str],
    pub tone: Option<&'static str>,
    /// Extra line shown under the message.
    pub note: Option<&'static str>,
    pub presentation: Presentation,
}

const BASE: ErrorProfile = ErrorProfile {
    severity: Severity::Error,
    icon: "❓",
    title: "Unexpected Error",
    default_message: "An unexpected error occurred. Please try again.",
    actions: &[Action::Retry, Action::Report, Action::Dismiss],
    primary_action: Some(Action::Retry),
    retryable: false,
    show_cooldown: false,
    suggestions: &[],
    tone: None,
    note: None,
    presentation: Presentation {
        primary_color: "#8b5cf6",
        glow_color: "rgba(139, 92, 246, 0.5)",
        border_style: "gradient",
        icon_animation: "pulse",
    },
};

static API_KEY_INVALID: ErrorProfile = ErrorProfile {
    icon: "🔑",
    title: "Invalid API Key",
    default_message: "Your API key appears to be invalid or expired.",
    actions: &[Action::Reconfigure, Action::Dismiss],
    primary_action: Some(Action::Reconfigure),
    suggestions: &[
        "Verify key format matches your provider",
        "Check expiration date in provider console",
        "Try regenerating your API key",
    ],
    presentation: Presentation {
        primary_color: "#d97706",
        glow_color: "rgba(217, 119, 6, 0.5)",
        border_style: "dashed",
        icon_animation: "shake",
    },
    ..BASE
};

static API_KEY_MISSING: ErrorProfile = ErrorProfile {
    severity: Severity::Warning,
    icon: "🔮",
    title: "API Key Required",
    default_message: "Welcome, Seeker! To begin your journey with the Mystic Oracle, please configure your LLM provider.",
    actions: &[Action::Configure, Action::Dismiss],
    primary_action: Some(Action::Configure),
    tone: Some("welcoming"),
    presentation: Presentation {
        primary_color: "#9d4edd",
        glow_color: "rgba(157, 78, 221, 0.4)",
        border_style: "gradient",
        icon_animation: "float",
    },
    ..BASE
};

static NETWORK_ERROR: ErrorProfile = ErrorProfile {
    icon: "🌐",
    title: "Connection Failed",
    default_message: "Unable to reach the server. Please check your internet connection.",
    actions: &[Action::Retry, Action::Dismiss],
    retryable: true,
    suggestions: &[
        "Check your internet connection",
        "Try disabling VPN or proxy",
        "Check firewall settings",
    ],
    presentation: Presentation {
        primary_color: "#0ea5e9",
        glow_color: "rgba(14, 165, 233, 0.5)",
        border_style: "dotted",
        icon_animation: "flicker",
    },
    ..BASE
};

static RATE_LIMIT: ErrorProfile = ErrorProfile {
    severity: Severity::Warning,
    icon: "⏱️",
    title: "Rate Limit Exceeded",
    default_message: "You've exceeded the API rate limit. Please wait before trying again.",
    actions: &[Action::Wait, Action::Dismiss],
    primary_action: None,
    show_cooldown: true,
    presentation: Presentation {
        primary_color: "#eab308",
        glow_color: "rgba(234, 179, 8, 0.5)",
        border_style: "solid",
        icon_animation: "pulse",
    },
    ..BASE
};

static LLM_TIMEOUT: ErrorProfile = ErrorProfile {
    icon: "⏰",
    title: "Request Timeout",
    default_message: "The request took too long to complete. Please try again.",
    actions: &[Action::Retry, Action::Dismiss],
    retryable: true,
    suggestions: &[
        "Your query may be too complex",
        "Try breaking it into smaller parts",
        "Server might be under heavy load",
    ],
    presentation: Presentation {
        primary_color: "#f97316",
        glow_color: "rgba(249, 115, 22, 0.5)",
        border_style: "double",
        icon_animation: "shake",
    },
    ..BASE
};

static LLM_STREAMING_ERROR: ErrorProfile = ErrorProfile {
    icon: "📡",
    title: "Streaming Interrupted",
    default_message: "Connection lost while streaming the response.",
    actions: &[Action::Retry, Action::Dismiss],
    retryable: true,
    presentation: Presentation {
        primary_color: "#a855f7",
        glow_color: "rgba(168, 85, 247, 0.5)",
        border_style: "animated",
        icon_animation: "glitch",
    },
    ..BASE
};

static LLM_INVALID_RESPONSE: ErrorProfile = ErrorProfile {
    icon: "❌",
    title: "Invalid Response",
    default_message: "The LLM returned an unexpected response format.",
    presentation: Presentation {
        primary_color: "#dc2626",
        glow_color: "rgba(220, 38, 38, 0.5)",
        border_style: "solid",
        icon_animation: "shake",
    },
    ..BASE
};

static VALIDATION_ERROR: ErrorProfile = ErrorProfile {
    severity: Severity::Warning,
    icon: "⚠️",
    title: "Validation Failed",
    default_message: "Please check your input and try again.",
    actions: &[Action::Dismiss],
    primary_action: Some(Action::Dismiss),
    tone: Some("friendly"),
    presentation: Presentation {
        primary_color: "#ec4899",
        glow_color: "rgba(236, 72, 153, 0.5)",
        border_style: "soft",
        icon_animation: "bounce",
    },
    ..BASE
};

static COMPONENT_LOAD_ERROR: ErrorProfile = ErrorProfile {
    icon: "🔧",
    title: "Component Failed to Load",
    default_message: "A required component failed to load. Please refresh the page.",
    actions: &[Action::Refresh, Action::Dismiss],
    primary_action: Some(Action::Refresh),
    suggestions: &[
        "Refresh the page",
        "Clear browser cache",
        "Check browser console for details",
    ],
    presentation: Presentation {
        primary_color: "#14b8a6",
        glow_color: "rgba(20, 184, 166, 0.5)",
        border_style: "tech",
        icon_animation: "spin",
    },
    ..BASE
};

static TAROT_DRAW_ERROR: ErrorProfile = ErrorProfile {
    icon: "🃏",
    title: "Tarot Draw Failed",
    default_message: "The cards resist being drawn... The cosmic energies are misaligned.",
    actions: &[Action::Retry, Action::Dismiss],
    retryable: true,
    tone: Some("mystical"),
    note: Some("Please wait a moment and try again. The oracle suggests patience..."),
    presentation: Presentation {
        primary_color: "#9333ea",
        glow_color: "rgba(147, 51, 234, 0.5)",
        border_style: "ornate",
        icon_animation: "spin",
    },
    ..BASE
};

static MOCK_MYSTICAL_ERROR: ErrorProfile = ErrorProfile {
    icon: "🌙",
    title: "Mystical Connection Disrupted",
    default_message: "The cosmic energies are in flux. The oracle cannot divine at this moment.",
    actions: &[Action::Retry, Action::Dismiss],
    retryable: true,
    tone: Some("mystical"),
    presentation: Presentation {
        primary_color: "#6366f1",
        glow_color: "rgba(99, 102, 241, 0.5)",
        border_style: "celestial",
        icon_animation: "float",
    },
    ..BASE
};

static UNKNOWN_ERROR: ErrorProfile = BASE;

/// Catalog lookup.
pub fn profile(kind: ErrorKind) -> &'static ErrorProfile {
    match kind {
        ErrorKind::ApiKeyInvalid => &API_KEY_INVALID,
        ErrorKind::ApiKeyMissing => &API_KEY_MISSING,
        ErrorKind::NetworkError => &NETWORK_ERROR,
        ErrorKind::RateLimit => &RATE_LIMIT,
        ErrorKind::LlmTimeout => &LLM_TIMEOUT,
        ErrorKind::LlmStreamingError => &LLM_STREAMING_ERROR,
        ErrorKind::LlmInvalidResponse => &LLM_INVALID_RESPONSE,
        ErrorKind::ValidationError => &VALIDATION_ERROR,
        ErrorKind::ComponentLoadError => &COMPONENT_LOAD_ERROR,
        ErrorKind::TarotDrawError => &TAROT_DRAW_ERROR,
        ErrorKind::MockMysticalError => &MOCK_MYSTICAL_ERROR,
        ErrorKind::UnknownError => &UNKNOWN_ERROR,
    }
}

/// A shown error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorRecord {
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    pub severity: Severity,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl ErrorRecord {
    pub fn profile(&self) -> &'static ErrorProfile {
        self.kind.profile()
    }
}

/// Current error, modal state, history and the auto-retry counter.
#[derive(Debug)]
pub struct ErrorStore {
    current: Option<ErrorRecord>,
    history: VecDeque<ErrorRecord>,
    modal_open: bool,
    retry_count: u32,
    max_auto_retries: u32,
}

impl Default for ErrorStore {
    fn default() -> Self {
        Self {
            current: None,
            history: VecDeque::with_capacity(ERROR_HISTORY_CAPACITY),
            modal_open: false,
            retry_count: 0,
            max_auto_retries: MAX_AUTO_RETRIES,
        }
    }
}

impl ErrorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `kind` the current error and record it.
    ///
    /// `custom_message` replaces the catalog's default message.
    pub fn show_error(
        &mut self,
        kind: ErrorKind,
        custom_message: Option<String>,
        metadata: serde_json::Map<String, serde_json::Value>,
    ) -> &ErrorRecord {
        let profile = kind.profile();
        let record = ErrorRecord {
            kind,
            severity: profile.severity,
            message: custom_message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| profile.default_message.to_string()),
            timestamp: Utc::now(),
            metadata,
        };

        warn!(kind = %kind, message = %record.message, "Error shown");

        self.history.push_front(record.clone());
        self.history.truncate(ERROR_HISTORY_CAPACITY);
        self.modal_open = true;
        self.current.insert(record)
    }

    /// Clear the current error, close the notice, reset retries.
    pub fn dismiss_error(&mut self) {
        self.current = None;
        self.modal_open = false;
        self.retry_count = 0;
        debug!("Error dismissed");
    }

    pub fn increment_retry_count(&mut self) {
        self.retry_count += 1;
    }

    pub fn reset_retry_count(&mut self) {
        self.retry_count = 0;
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn current(&self) -> Option<&ErrorRecord> {
        self.current.as_ref()
    }

    pub fn has_active_error(&self) -> bool {
        self.current.is_some()
    }

    pub fn is_modal_open(&self) -> bool {
        self.modal_open
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn max_auto_retries(&self) -> u32 {
        self.max_auto_retries
    }

    /// Current error is retryable and the retry budget is not spent.
    pub fn can_retry(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|e| e.profile().retryable && self.retry_count < self.max_auto_retries)
    }

    /// Most recent first.
    pub fn recent_errors(&self) -> impl Iterator<Item = &ErrorRecord> {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}
