//! ChatSession — the ordered message list shown in the conversation view.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::responder::event::Component;

/// Who a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

/// One message in the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionMessage {
    pub id: Uuid,
    pub role: MessageRole,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<Component>,
    pub timestamp: DateTime<Utc>,
    /// Still receiving text.
    pub streaming: bool,
    /// Failure shown in place of (or after) the content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SessionMessage {
    fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            component: None,
            timestamp: Utc::now(),
            streaming: false,
            error: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Empty assistant message that text will stream into.
    pub fn placeholder() -> Self {
        Self {
            streaming: true,
            ..Self::assistant("")
        }
    }

    pub fn with_component(component: Component) -> Self {
        Self {
            component: Some(component),
            ..Self::assistant("")
        }
    }
}

/// Partial update for [`ChatSession::update_by_id`]. Only `Some` fields apply.
#[derive(Debug, Clone, Default)]
pub struct MessagePatch {
    pub content: Option<String>,
    pub component: Option<Component>,
    pub streaming: Option<bool>,
    pub error: Option<String>,
}

impl MessagePatch {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn finished(mut self) -> Self {
        self.streaming = Some(false);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// In-memory message list for one conversation.
#[derive(Debug, Default)]
pub struct ChatSession {
    messages: Vec<SessionMessage>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return its id.
    pub fn append(&mut self, message: SessionMessage) -> Uuid {
        let id = message.id;
        debug!(id = %id, role = ?message.role, "Appended message");
        self.messages.push(message);
        id
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        debug!("Chat session cleared");
    }

    /// Merge the patch into the message with `id`. Absent ids are ignored.
    pub fn update_by_id(&mut self, id: Uuid, patch: MessagePatch) -> bool {
        let Some(message) = self.messages.iter_mut().find(|m| m.id == id) else {
            return false;
        };
        if let Some(content) = patch.content {
            message.content = content;
        }
        if let Some(component) = patch.component {
            message.component = Some(component);
        }
        if let Some(streaming) = patch.streaming {
            message.streaming = streaming;
        }
        if let Some(error) = patch.error {
            message.error = Some(error);
        }
        true
    }

    /// Swap the message with `id` for `message`. Absent ids are ignored.
    pub fn replace_by_id(&mut self, id: Uuid, message: SessionMessage) -> bool {
        match self.messages.iter_mut().find(|m| m.id == id) {
            Some(slot) => {
                *slot = message;
                true
            }
            None => false,
        }
    }

    pub fn messages(&self) -> &[SessionMessage] {
        &self.messages
    }

    pub fn get(&self, id: Uuid) -> Option<&SessionMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn last(&self) -> Option<&SessionMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::responder::event::DeckMode;

    #[test]
    fn append_keeps_order() {
        let mut chat = ChatSession::new();
        let a = chat.append(SessionMessage::user("first"));
        let b = chat.append(SessionMessage::assistant("second"));
        assert_eq!(chat.len(), 2);
        assert_eq!(chat.messages()[0].id, a);
        assert_eq!(chat.last().unwrap().id, b);
    }

    #[test]
    fn update_merges_only_present_fields() {
        let mut chat = ChatSession::new();
        let id = chat.append(SessionMessage::placeholder());

        assert!(chat.update_by_id(id, MessagePatch::content("The cards")));
        let msg = chat.get(id).unwrap();
        assert_eq!(msg.content, "The cards");
        assert!(msg.streaming);

        assert!(chat.update_by_id(id, MessagePatch::default().finished()));
        let msg = chat.get(id).unwrap();
        assert_eq!(msg.content, "The cards");
        assert!(!msg.streaming);
        assert!(msg.error.is_none());
    }

    #[test]
    fn update_and_replace_ignore_unknown_ids() {
        let mut chat = ChatSession::new();
        chat.append(SessionMessage::user("hello"));
        let before = chat.messages().to_vec();

        assert!(!chat.update_by_id(Uuid::new_v4(), MessagePatch::content("x")));
        assert!(!chat.replace_by_id(Uuid::new_v4(), SessionMessage::system("y")));
        assert_eq!(chat.messages(), &before[..]);
    }

    #[test]
    fn replace_swaps_whole_message() {
        let mut chat = ChatSession::new();
        let id = chat.append(SessionMessage::placeholder());
        let replacement = SessionMessage::with_component(Component::deck(DeckMode::Single, 1));
        let new_id = replacement.id;

        assert!(chat.replace_by_id(id, replacement));
        assert_eq!(chat.len(), 1);
        assert!(chat.get(id).is_none());
        assert!(chat.get(new_id).unwrap().component.is_some());
    }

    #[test]
    fn clear_empties() {
        let mut chat = ChatSession::new();
        chat.append(SessionMessage::user("a"));
        chat.clear();
        assert!(chat.is_empty());
    }

    #[test]
    fn serializes_component_messages() {
        let msg = SessionMessage::with_component(Component::deck(DeckMode::Multiple, 3));
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(v["role"], "assistant");
        assert_eq!(v["component"]["componentName"], "TarotDeck");
        assert!(v.get("error").is_none());
    }
}
