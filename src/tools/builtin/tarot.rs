//! Card-drawing tools the oracle model calls instead of inventing cards.
//!
//! Draw tools answer with a JSON array of `{cardName, orientation}`; the
//! interactive deck tool answers with `{mode, count, componentType}` so the
//! responder can turn either shape into a UI component.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::json;

use crate::context::ToolContext;
use crate::deck::{DeckType, SpreadKind, draw_spread};
use crate::responder::event::DeckMode;
use crate::tools::tool::{Tool, ToolError, ToolOutput, optional_str};

/// Marker the responder looks for to recognize a deck payload.
pub const DECK_COMPONENT_TYPE: &str = "TarotDeck";

/// The four tools registered with the real responder.
pub fn tarot_tools() -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(DrawCardsTool::single()),
        Arc::new(DrawCardsTool::three_card()),
        Arc::new(DrawCardsTool::celtic_cross()),
        Arc::new(InteractiveDeckTool),
    ]
}

/// Draws a fixed-size spread from the full or major deck.
pub struct DrawCardsTool {
    name: &'static str,
    description: &'static str,
    deck_hint: &'static str,
    kind: SpreadKind,
}

impl DrawCardsTool {
    pub fn single() -> Self {
        Self {
            name: "draw_single_card",
            description: "Draws a single tarot card for a quick reading or answer to a specific \
                question. You can choose to draw from the full 78-card deck (major and minor \
                arcana) or only the 22 major arcana cards. Use 'full' for comprehensive readings, \
                'major' for archetypal insights.",
            deck_hint: "Type of deck to draw from: 'full' for all 78 cards (major + minor \
                arcana), 'major' for only 22 major arcana cards",
            kind: SpreadKind::SingleCard,
        }
    }

    pub fn three_card() -> Self {
        Self {
            name: "draw_three_card_spread",
            description: "Draws a three-card spread, typically representing past, present, and \
                future. You can choose to draw from the full 78-card deck or only the 22 major \
                arcana cards. Use 'full' for detailed readings, 'major' for archetypal journey \
                insights.",
            deck_hint: "Type of deck to draw from: 'full' for all 78 cards, 'major' for only \
                major arcana",
            kind: SpreadKind::ThreeCard,
        }
    }

    pub fn celtic_cross() -> Self {
        Self {
            name: "draw_celtic_cross_spread",
            description: "Draws a Celtic Cross spread (10 cards) for a comprehensive, in-depth \
                reading covering multiple aspects of a situation. You can choose to draw from the \
                full 78-card deck or only the 22 major arcana cards. Use 'full' for detailed \
                readings, 'major' for archetypal journey focus.",
            deck_hint: "Type of deck to draw from: 'full' for all 78 cards, 'major' for only \
                major arcana",
            kind: SpreadKind::CelticCross,
        }
    }

    pub fn kind(&self) -> SpreadKind {
        self.kind
    }
}

fn parse_deck_type(params: &serde_json::Value) -> Result<DeckType, ToolError> {
    match optional_str(params, "deckType")? {
        None => Ok(DeckType::Full),
        Some(s) => s.parse().map_err(|_| {
            ToolError::InvalidParameters(format!(
                "deckType must be 'full' or 'major', got '{}'",
                s
            ))
        }),
    }
}

#[async_trait]
impl Tool for DrawCardsTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "deckType": {
                    "type": "string",
                    "enum": ["full", "major"],
                    "default": "full",
                    "description": self.deck_hint
                }
            }
        })
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        _ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();
        let deck = parse_deck_type(&params)?;

        let cards = {
            let mut rng = rand::thread_rng();
            draw_spread(self.kind, deck.cards(), &mut rng)
        };

        let result: Vec<serde_json::Value> = cards
            .iter()
            .map(|c| json!({"cardName": c.card_name, "orientation": c.orientation}))
            .collect();

        tracing::debug!(
            tool = self.name,
            deck = deck.as_str(),
            count = result.len(),
            "Drew cards"
        );

        Ok(ToolOutput::success(
            serde_json::Value::Array(result),
            start.elapsed(),
        ))
    }
}

/// Asks the UI to show a deck the user picks from.
pub struct InteractiveDeckTool;

#[async_trait]
impl Tool for InteractiveDeckTool {
    fn name(&self) -> &str {
        "show_interactive_deck"
    }

    fn description(&self) -> &str {
        "Shows an interactive tarot deck where the user can select their own cards. Use this \
         when the user wants to be more involved in the card selection process or prefers \
         choosing cards themselves."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "mode": {
                    "type": "string",
                    "enum": ["single", "multiple"],
                    "description": "Whether to draw a single card or multiple cards"
                },
                "count": {
                    "type": "integer",
                    "minimum": 1,
                    "description": "Number of cards to draw (for 'multiple' mode)"
                }
            },
            "required": ["mode"]
        })
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        _ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();

        let mode = match optional_str(&params, "mode")? {
            None | Some("single") => DeckMode::Single,
            Some("multiple") => DeckMode::Multiple,
            Some(other) => {
                return Err(ToolError::InvalidParameters(format!(
                    "mode must be 'single' or 'multiple', got '{}'",
                    other
                )));
            }
        };

        let count = match params.get("count") {
            None | Some(serde_json::Value::Null) => 1,
            Some(v) => match v.as_u64() {
                Some(0) => 1,
                Some(n) => n,
                None => {
                    return Err(ToolError::InvalidParameters(format!(
                        "count must be a positive integer, got {}",
                        v
                    )));
                }
            },
        };

        Ok(ToolOutput::success(
            json!({
                "mode": mode,
                "count": count,
                "componentType": DECK_COMPONENT_TYPE,
            }),
            start.elapsed(),
        ))
    }
}
