//! Tool abstraction for the oracle's card-drawing capabilities.

pub mod builtin;
pub mod registry;
pub mod tool;

pub use builtin::{DECK_COMPONENT_TYPE, tarot_tools};
pub use registry::ToolRegistry;
pub use tool::*;
