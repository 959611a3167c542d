//! Draw primitives — single draws, forced orientation, and shuffled multi-card draws.
//!
//! All functions are stateless over the immutable decks and take the random
//! source explicitly, so callers can pass `thread_rng()` or a seeded `StdRng`.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::model::{Arcana, Card, Rank, Suit};

/// Upright or reversed presentation of a drawn card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Upright,
    Reversed,
}

impl Orientation {
    /// Pick an orientation with probability 0.5 each way.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.gen_bool(0.5) {
            Self::Reversed
        } else {
            Self::Upright
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upright => "upright",
            Self::Reversed => "reversed",
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A card produced by one draw call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawnCard {
    pub card_name: String,
    pub orientation: Orientation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arcana: Option<Arcana>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suit: Option<Suit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<Rank>,
}

impl DrawnCard {
    pub fn new(card: &Card, orientation: Orientation) -> Self {
        Self {
            card_name: card.name.clone(),
            orientation,
            arcana: Some(card.arcana),
            suit: card.suit,
            rank: card.rank,
        }
    }

    pub fn is_reversed(&self) -> bool {
        self.orientation == Orientation::Reversed
    }
}

/// Named fixed-size multi-card draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpreadKind {
    SingleCard,
    ThreeCard,
    CelticCross,
}

impl SpreadKind {
    pub fn size(&self) -> usize {
        match self {
            Self::SingleCard => 1,
            Self::ThreeCard => 3,
            Self::CelticCross => 10,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SingleCard => "single-card",
            Self::ThreeCard => "three-card",
            Self::CelticCross => "celtic-cross",
        }
    }
}

/// Draw one card uniformly at random with a random orientation.
pub fn draw_single<R: Rng + ?Sized>(deck: &[Card], rng: &mut R) -> DrawnCard {
    let card = pick(deck, rng);
    DrawnCard::new(card, Orientation::random(rng))
}

/// Draw one card uniformly at random with a fixed orientation.
///
/// Card selection consumes the random source exactly like [`draw_single`];
/// only the orientation roll is skipped.
pub fn draw_forced_orientation<R: Rng + ?Sized>(
    deck: &[Card],
    orientation: Orientation,
    rng: &mut R,
) -> DrawnCard {
    DrawnCard::new(pick(deck, rng), orientation)
}

/// Draw `count` distinct cards (clamped to the deck size).
///
/// Shuffles a full copy of the deck (Fisher–Yates) and takes the first
/// `count` cards, each with an independent random orientation.
pub fn draw_multiple<R: Rng + ?Sized>(deck: &[Card], count: usize, rng: &mut R) -> Vec<DrawnCard> {
    let mut shuffled: Vec<&Card> = deck.iter().collect();
    shuffled.shuffle(rng);
    shuffled
        .into_iter()
        .take(count)
        .map(|card| DrawnCard::new(card, Orientation::random(&mut *rng)))
        .collect()
}

/// Draw the cards for a named spread.
pub fn draw_spread<R: Rng + ?Sized>(kind: SpreadKind, deck: &[Card], rng: &mut R) -> Vec<DrawnCard> {
    draw_multiple(deck, kind.size(), rng)
}

/// Clamp an untrusted signed count into `[0, deck_len]`.
pub fn clamp_count(count: i64, deck_len: usize) -> usize {
    if count <= 0 {
        0
    } else {
        usize::try_from(count).map_or(deck_len, |c| c.min(deck_len))
    }
}

fn pick<'a, R: Rng + ?Sized>(deck: &'a [Card], rng: &mut R) -> &'a Card {
    &deck[rng.gen_range(0..deck.len())]
}
