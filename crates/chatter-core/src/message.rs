//! Chat message types.

use std::time::{SystemTime, UNIX_EPOCH};

/// A single chat message.
///
/// The stream treats messages as opaque values: once accepted they are
/// appended and replayed verbatim, never inspected or rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Display name of the sender.
    pub sender: String,
    /// Message body.
    pub text: String,
    /// When the message was accepted, in milliseconds since the Unix epoch.
    pub timestamp: u64,
}

impl ChatMessage {
    /// Create a new message, stamped with the current time.
    #[must_use]
    pub fn new(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            text: text.into(),
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap()
                .as_millis() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_creation() {
        let msg = ChatMessage::new("alice", "hello");
        assert_eq!(msg.sender, "alice");
        assert_eq!(msg.text, "hello");
        assert!(msg.timestamp > 0);
    }
}
