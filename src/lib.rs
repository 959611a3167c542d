//! Tarot oracle — streaming chat responders, tarot tools, and error recovery.

pub mod config;
pub mod context;
pub mod deck;
pub mod error;
pub mod llm;
pub mod locale;
pub mod recovery;
pub mod render;
pub mod responder;
pub mod shell;
pub mod store;
pub mod tools;
pub mod turn;
