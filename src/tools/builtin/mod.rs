//! Built-in tools for card draws and the interactive deck.

pub mod tarot;

pub use tarot::{DECK_COMPONENT_TYPE, DrawCardsTool, InteractiveDeckTool, tarot_tools};
