//! Slash-command table for the mock responder.
//!
//! Commands are resolved by a direct lookup on the normalized input; anything
//! that is not in the table is a free-form question for the oracle.

use crate::deck::{DeckType, Orientation, SpreadKind};
use crate::error::ErrorCode;
use crate::responder::event::DeckMode;

/// Long texts the mock streams verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Literal {
    Help,
    MarkdownDemo,
}

/// What a command does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// One card, random orientation.
    Draw { deck: DeckType },
    /// One card with a fixed orientation.
    DrawForced {
        deck: DeckType,
        orientation: Orientation,
    },
    /// A named multi-card spread.
    Spread { kind: SpreadKind, deck: DeckType },
    /// Let the user pick cards from an interactive deck.
    Deck { mode: DeckMode, count: usize },
    /// Stream a literal text.
    Literal(Literal),
    /// Fail with the given code. `partial` streams the prefix text first.
    Fail { code: ErrorCode, partial: bool },
}

impl Command {
    /// Look up a command. Input is trimmed and lowercased first.
    pub fn parse(input: &str) -> Option<Command> {
        let normalized = input.trim().to_lowercase();

        let command = match normalized.as_str() {
            "/draw" | "/card" => Command::Draw {
                deck: DeckType::Full,
            },
            "/draw-reversed" => Command::DrawForced {
                deck: DeckType::Full,
                orientation: Orientation::Reversed,
            },
            "/draw-major" => Command::Draw {
                deck: DeckType::Major,
            },
            "/spread" => Command::Spread {
                kind: SpreadKind::ThreeCard,
                deck: DeckType::Full,
            },
            "/spread-major" => Command::Spread {
                kind: SpreadKind::ThreeCard,
                deck: DeckType::Major,
            },
            "/celtic-cross" => Command::Spread {
                kind: SpreadKind::CelticCross,
                deck: DeckType::Full,
            },
            "/celtic-major" => Command::Spread {
                kind: SpreadKind::CelticCross,
                deck: DeckType::Major,
            },
            "/deck" => Command::Deck {
                mode: DeckMode::Single,
                count: 1,
            },
            "/deck-multiple" => Command::Deck {
                mode: DeckMode::Multiple,
                count: 3,
            },
            "/help" => Command::Literal(Literal::Help),
            "/markdown" | "/md" => Command::Literal(Literal::MarkdownDemo),
            "/error" | "/error-mystical" => Command::Fail {
                code: ErrorCode::MysticalError,
                partial: false,
            },
            "/error-network" => Command::Fail {
                code: ErrorCode::NetworkError,
                partial: false,
            },
            "/error-timeout" => Command::Fail {
                code: ErrorCode::Timeout,
                partial: false,
            },
            "/error-stream" => Command::Fail {
                code: ErrorCode::StreamingError,
                partial: true,
            },
            "/error-rate-limit" | "/error-ratelimit" => Command::Fail {
                code: ErrorCode::RateLimit,
                partial: false,
            },
            _ => return None,
        };

        Some(command)
    }
}
