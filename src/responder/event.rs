//! Response event protocol and the component registry.
//!
//! Every responder emits the same four event shapes. Components are typed
//! payloads behind a `(name, data)` pair; [`Component::from_parts`] is the
//! validating entry point for payloads that arrive as loose JSON.

use serde::{Deserialize, Serialize};

use crate::deck::{DrawnCard, Orientation, SpreadKind};
use crate::error::{ComponentError, ErrorCode};

/// Delay between card reveals in a spread, in milliseconds.
pub const DEFAULT_REVEAL_DELAY_MS: u64 = 500;

/// One event in a responder's output sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ResponseEvent {
    /// A new chunk of text plus everything streamed so far.
    Text {
        chunk: String,
        #[serde(rename = "fullText")]
        full_text: String,
    },
    /// A rich component for the UI to render, serialized as `{componentName, data}`.
    Component(Component),
    /// Terminal success.
    Done {
        #[serde(rename = "fullText")]
        full_text: String,
    },
    /// Terminal failure reported in-band.
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<ErrorCode>,
    },
}

impl ResponseEvent {
    pub fn text(chunk: impl Into<String>, full_text: impl Into<String>) -> Self {
        Self::Text {
            chunk: chunk.into(),
            full_text: full_text.into(),
        }
    }

    pub fn component(component: Component) -> Self {
        Self::Component(component)
    }

    pub fn done(full_text: impl Into<String>) -> Self {
        Self::Done {
            full_text: full_text.into(),
        }
    }

    pub fn error(message: impl Into<String>, code: Option<ErrorCode>) -> Self {
        Self::Error {
            message: message.into(),
            code,
        }
    }

    /// `Done` and `Error` end a stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Error { .. })
    }
}

/// A single revealed card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardView {
    #[serde(flatten)]
    pub card: DrawnCard,
    #[serde(default = "default_true")]
    pub is_revealed: bool,
}

/// A multi-card spread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpreadView {
    #[serde(default = "default_spread_kind")]
    pub spread_type: SpreadKind,
    pub cards: Vec<DrawnCard>,
    #[serde(default = "default_true")]
    pub auto_reveal: bool,
    #[serde(default = "default_reveal_delay")]
    pub reveal_delay: u64,
}

/// How many cards the user picks from the interactive deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeckMode {
    #[default]
    Single,
    Multiple,
}

impl DeckMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Multiple => "multiple",
        }
    }
}

/// An interactive deck the user draws from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckView {
    pub mode: DeckMode,
    pub count: usize,
}

/// Components the chat UI knows how to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Component {
    TarotCard(CardView),
    TarotSpread(SpreadView),
    TarotDeck(DeckView),
}

impl Component {
    /// Registered component names.
    pub const NAMES: [&'static str; 3] = ["TarotCard", "TarotSpread", "TarotDeck"];

    pub fn card(card: DrawnCard) -> Self {
        Self::TarotCard(CardView {
            card,
            is_revealed: true,
        })
    }

    pub fn spread(spread_type: SpreadKind, cards: Vec<DrawnCard>) -> Self {
        Self::TarotSpread(SpreadView {
            spread_type,
            cards,
            auto_reveal: true,
            reveal_delay: DEFAULT_REVEAL_DELAY_MS,
        })
    }

    pub fn deck(mode: DeckMode, count: usize) -> Self {
        Self::TarotDeck(DeckView { mode, count })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::TarotCard(_) => "TarotCard",
            Self::TarotSpread(_) => "TarotSpread",
            Self::TarotDeck(_) => "TarotDeck",
        }
    }

    /// JSON props for the component.
    pub fn data(&self) -> serde_json::Value {
        let value = match self {
            Self::TarotCard(view) => serde_json::to_value(view),
            Self::TarotSpread(view) => serde_json::to_value(view),
            Self::TarotDeck(view) => serde_json::to_value(view),
        };
        // Plain derived structs with string keys always serialize.
        value.unwrap_or(serde_json::Value::Null)
    }

    pub fn is_registered(name: &str) -> bool {
        Self::NAMES.contains(&name)
    }

    /// Validate and build a component from a name and loose JSON props.
    pub fn from_parts(name: &str, data: &serde_json::Value) -> Result<Self, ComponentError> {
        let problems = validate(name, data);
        if !problems.is_empty() {
            return Err(ComponentError {
                component: name.to_string(),
                problems,
            });
        }

        let parsed = match name {
            "TarotCard" => serde_json::from_value(data.clone()).map(Self::TarotCard),
            "TarotSpread" => serde_json::from_value(data.clone()).map(Self::TarotSpread),
            _ => {
                let mode = data
                    .get("mode")
                    .and_then(|v| v.as_str())
                    .map(|m| if m == "multiple" { DeckMode::Multiple } else { DeckMode::Single })
                    .unwrap_or_default();
                let count = data.get("count").and_then(|v| v.as_u64()).unwrap_or(1) as usize;
                Ok(Self::deck(mode, count))
            }
        };

        parsed.map_err(|e| ComponentError {
            component: name.to_string(),
            problems: vec![e.to_string()],
        })
    }
}

/// Collect every problem with a component payload.
pub fn validate(name: &str, data: &serde_json::Value) -> Vec<String> {
    let mut problems = Vec::new();
    let str_field = |key: &str| data.get(key).and_then(|v| v.as_str());

    match name {
        "TarotCard" => {
            if str_field("cardName").is_none_or(str::is_empty) {
                problems.push("TarotCard requires cardName".to_string());
            }
            if let Some(o) = str_field("orientation")
                && o != Orientation::Upright.as_str()
                && o != Orientation::Reversed.as_str()
            {
                problems.push("TarotCard orientation must be \"upright\" or \"reversed\"".to_string());
            }
        }
        "TarotSpread" => {
            if !data.get("cards").is_some_and(|v| v.is_array()) {
                problems.push("TarotSpread requires cards array".to_string());
            }
            if let Some(s) = str_field("spreadType")
                && ![
                    SpreadKind::ThreeCard.as_str(),
                    SpreadKind::CelticCross.as_str(),
                    SpreadKind::SingleCard.as_str(),
                ]
                .contains(&s)
            {
                problems.push(
                    "TarotSpread spreadType must be \"three-card\", \"celtic-cross\", or \"single-card\""
                        .to_string(),
                );
            }
        }
        "TarotDeck" => {
            if let Some(m) = str_field("mode")
                && m != DeckMode::Single.as_str()
                && m != DeckMode::Multiple.as_str()
            {
                problems.push("TarotDeck mode must be \"single\" or \"multiple\"".to_string());
            }
        }
        other => problems.push(format!("Unknown component: {}", other)),
    }

    problems
}

impl Serialize for Component {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("componentName", self.name())?;
        match self {
            Self::TarotCard(view) => map.serialize_entry("data", view)?,
            Self::TarotSpread(view) => map.serialize_entry("data", view)?,
            Self::TarotDeck(view) => map.serialize_entry("data", view)?,
        }
        map.end()
    }
}

fn default_spread_kind() -> SpreadKind {
    SpreadKind::ThreeCard
}

fn default_true() -> bool {
    true
}

fn default_reveal_delay() -> u64 {
    DEFAULT_REVEAL_DELAY_MS
}
