//! Per-turn context handed to tools.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::locale::Locale;

/// Context for one responder turn.
#[derive(Debug, Clone, Serialize)]
pub struct ToolContext {
    /// Unique turn ID, shared by every tool call in the turn.
    pub turn_id: Uuid,
    /// Locale the reading is given in.
    pub locale: Locale,
    /// When the turn started.
    pub created_at: DateTime<Utc>,
}

impl Default for ToolContext {
    fn default() -> Self {
        Self {
            turn_id: Uuid::new_v4(),
            locale: Locale::default(),
            created_at: Utc::now(),
        }
    }
}

impl ToolContext {
    pub fn new(locale: Locale) -> Self {
        Self {
            locale,
            ..Default::default()
        }
    }
}
