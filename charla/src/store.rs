//! Append-only message log with the single pending-placeholder convention.

use crate::message::{ChatMessage, Sender};

/// Ordered log of chat messages.
///
/// Entries are append-only except for the reserved pending placeholder
/// (`"..."`, agent sender), which is replaced in place when its reply
/// arrives. At most one placeholder exists at a time; transports gate
/// `push_pending` on [`MessageLog::has_pending`] under the same lock, which
/// is what keeps request/reply correlation positional and safe.
#[derive(Debug, Default)]
pub struct MessageLog {
    entries: Vec<ChatMessage>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&mut self, text: &str) {
        self.entries.push(ChatMessage::new(Sender::User, text));
    }

    pub fn push_agent(&mut self, text: impl Into<String>) {
        self.entries.push(ChatMessage::new(Sender::Agent, text));
    }

    /// Appends the pending placeholder. Callers must check [`has_pending`]
    /// first; this method does not enforce the invariant itself.
    ///
    /// [`has_pending`]: MessageLog::has_pending
    pub fn push_pending(&mut self) {
        self.entries
            .push(ChatMessage::new(Sender::Agent, crate::message::PENDING_TEXT));
    }

    pub fn has_pending(&self) -> bool {
        self.entries.iter().any(ChatMessage::is_pending)
    }

    /// Replaces the first pending placeholder in place with `text` (the id is
    /// kept). When no placeholder is outstanding the text is appended as a
    /// fresh agent message (unsolicited server push).
    pub fn resolve_pending(&mut self, text: impl Into<String>) {
        match self.entries.iter_mut().find(|m| m.is_pending()) {
            Some(slot) => slot.text = text.into(),
            None => self.push_agent(text),
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of the log for display.
    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.entries.clone()
    }
}
