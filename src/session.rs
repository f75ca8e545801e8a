//! Chat session store
//!
//! Holds the ordered message log and the transient UI flags (pending request,
//! message being revealed, message under inspection). It performs no I/O;
//! every change goes through one of the mutation methods below, each of which
//! bumps [`ChatSession::revision`] so a renderer can poll for changes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier of a message within one session. Later messages compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(u64);

impl MessageId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatRole {
    User,
    Assistant,
}

/// A chat message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    id: MessageId,
    role: ChatRole,
    pub content: String,
    raw_payload: Option<Value>,
}

impl ChatMessage {
    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn role(&self) -> ChatRole {
        self.role
    }

    /// Full server response this message was derived from (assistant only).
    pub fn raw_payload(&self) -> Option<&Value> {
        self.raw_payload.as_ref()
    }

    pub fn is_inspectable(&self) -> bool {
        self.raw_payload.is_some()
    }
}

#[derive(Debug, Default)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
    pending: bool,
    animating: Option<MessageId>,
    selected: Option<MessageId>,
    next_id: u64,
    revision: u64,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session with a single assistant greeting (never animated).
    pub fn with_welcome(text: &str) -> Self {
        let mut session = Self::new();
        session.push(ChatRole::Assistant, text.to_string(), None);
        session
    }

    fn push(&mut self, role: ChatRole, content: String, raw_payload: Option<Value>) -> MessageId {
        self.next_id += 1;
        let id = MessageId(self.next_id);
        self.messages.push(ChatMessage {
            id,
            role,
            content,
            raw_payload,
        });
        self.revision += 1;
        id
    }

    /// Append the user's text. Ignored when the trimmed text is empty or a
    /// request is already pending.
    pub fn append_user_message(&mut self, text: &str) -> Option<MessageId> {
        let text = text.trim();
        if text.is_empty() || self.pending {
            return None;
        }
        let id = self.push(ChatRole::User, text.to_string(), None);
        self.pending = true;
        Some(id)
    }

    /// Append an empty assistant message, ready to be filled by the animator.
    pub fn append_assistant_message(&mut self, raw_payload: Option<Value>) -> MessageId {
        let id = self.push(ChatRole::Assistant, String::new(), raw_payload);
        self.pending = false;
        id
    }

    /// Append the terminal message of a failed turn.
    pub fn append_error_message(&mut self, text: &str) -> MessageId {
        let id = self.push(ChatRole::Assistant, text.to_string(), None);
        self.pending = false;
        id
    }

    pub fn update_message_content(&mut self, id: MessageId, text: &str) {
        if let Some(message) = self.messages.iter_mut().find(|m| m.id == id) {
            message.content.clear();
            message.content.push_str(text);
            self.revision += 1;
        }
    }

    pub fn set_animating(&mut self, id: Option<MessageId>) {
        if self.animating != id {
            self.animating = id;
            self.revision += 1;
        }
    }

    /// Select a message for inspection. Only messages carrying a raw payload
    /// can be selected; anything else leaves the selection untouched.
    pub fn select(&mut self, id: Option<MessageId>) -> bool {
        let Some(id) = id else {
            self.clear_selection();
            return true;
        };
        if !self.message(id).is_some_and(ChatMessage::is_inspectable) {
            return false;
        }
        if self.selected != Some(id) {
            self.selected = Some(id);
            self.revision += 1;
        }
        true
    }

    pub fn clear_selection(&mut self) {
        if self.selected.take().is_some() {
            self.revision += 1;
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn message(&self, id: MessageId) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn animating(&self) -> Option<MessageId> {
        self.animating
    }

    pub fn selected(&self) -> Option<MessageId> {
        self.selected
    }

    pub fn selected_message(&self) -> Option<&ChatMessage> {
        self.selected.and_then(|id| self.message(id))
    }

    pub fn last_assistant_id(&self) -> Option<MessageId> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::Assistant)
            .map(|m| m.id)
    }

    /// Monotonic change counter, bumped on every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}
