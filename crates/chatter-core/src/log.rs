//! Append-only message history for a single room.

use crate::message::ChatMessage;
use std::sync::Arc;

/// Ordered, append-only message log.
///
/// Insertion order is the authoritative ordering: once appended, a message
/// keeps its position for the lifetime of the log, and the length only
/// grows. Messages are stored behind `Arc` so snapshots clone pointers,
/// not message bodies.
#[derive(Debug, Default)]
pub struct MessageLog {
    entries: Vec<Arc<ChatMessage>>,
}

impl MessageLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message at the end, returning the new length.
    pub fn append(&mut self, message: ChatMessage) -> usize {
        self.entries.push(Arc::new(message));
        self.entries.len()
    }

    /// Current number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log holds no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All messages at positions `[cursor, len)`, in order.
    ///
    /// A cursor at (or beyond) the current length yields an empty slice.
    #[must_use]
    pub fn slice_from(&self, cursor: usize) -> Vec<Arc<ChatMessage>> {
        self.entries[cursor.min(self.entries.len())..].to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_len() {
        let mut log = MessageLog::new();
        assert!(log.is_empty());

        assert_eq!(log.append(ChatMessage::new("a", "one")), 1);
        assert_eq!(log.append(ChatMessage::new("b", "two")), 2);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_slice_from_preserves_order() {
        let mut log = MessageLog::new();
        log.append(ChatMessage::new("a", "one"));
        log.append(ChatMessage::new("a", "two"));
        log.append(ChatMessage::new("a", "three"));

        let tail = log.slice_from(1);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].text, "two");
        assert_eq!(tail[1].text, "three");
    }

    #[test]
    fn test_slice_from_end_is_empty() {
        let mut log = MessageLog::new();
        log.append(ChatMessage::new("a", "one"));

        assert!(log.slice_from(1).is_empty());
        assert!(log.slice_from(99).is_empty());
    }
}
