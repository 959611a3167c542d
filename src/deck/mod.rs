//! Tarot deck — static card data and fair draw operations.

pub mod draw;
pub mod model;

pub use draw::{
    DrawnCard, Orientation, SpreadKind, clamp_count, draw_forced_orientation, draw_multiple,
    draw_single, draw_spread,
};
pub use model::{
    Arcana, Card, DeckType, Rank, Suit, find_card, full_deck, major_arcana, minor_arcana,
};
