//! Room registry: maps room names to lazily-created streams.

use crate::stream::ChatStream;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// Maximum room name length.
pub const MAX_ROOM_NAME_LENGTH: usize = 256;

/// Validate a room name.
///
/// # Errors
///
/// Returns an error message if the room name is invalid.
pub fn validate_room_name(name: &str) -> Result<(), &'static str> {
    if name.is_empty() {
        return Err("Room name cannot be empty");
    }
    if name.len() > MAX_ROOM_NAME_LENGTH {
        return Err("Room name too long");
    }
    if !name.chars().all(|c| c.is_ascii() && !c.is_ascii_control()) {
        return Err("Room name contains invalid characters");
    }
    Ok(())
}

/// Registry of chat rooms.
///
/// A stream is created on the first reference to its room name and
/// retained for the process lifetime; concurrent first references to the
/// same unseen name observe a single instance.
#[derive(Debug, Default)]
pub struct StreamRegistry {
    rooms: DashMap<String, Arc<ChatStream>>,
}

impl StreamRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the stream for `room`, creating it on first reference.
    #[must_use]
    pub fn room(&self, room: &str) -> Arc<ChatStream> {
        if let Some(stream) = self.rooms.get(room) {
            return Arc::clone(&stream);
        }
        let entry = self.rooms.entry(room.to_string()).or_insert_with(|| {
            debug!(room = %room, "creating room");
            Arc::new(ChatStream::new())
        });
        Arc::clone(&entry)
    }

    /// Whether a room already exists.
    #[must_use]
    pub fn contains(&self, room: &str) -> bool {
        self.rooms.contains_key(room)
    }

    /// Number of rooms created so far.
    #[must_use]
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// All room names.
    #[must_use]
    pub fn room_names(&self) -> Vec<String> {
        self.rooms.iter().map(|e| e.key().clone()).collect()
    }

    /// Aggregate counters across all rooms.
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        let mut stats = RegistryStats {
            room_count: self.rooms.len(),
            ..RegistryStats::default()
        };
        for entry in self.rooms.iter() {
            stats.listener_count += entry.listener_count();
            stats.message_count += entry.len();
        }
        stats
    }
}

/// Registry statistics.
#[derive(Debug, Clone, Default)]
pub struct RegistryStats {
    /// Number of rooms created since process start.
    pub room_count: usize,
    /// Listeners currently registered across all rooms.
    pub listener_count: usize,
    /// Messages held across all room logs.
    pub message_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::ChatMessage;

    #[test]
    fn test_room_created_lazily_and_retained() {
        let registry = StreamRegistry::new();
        assert!(!registry.contains("lobby"));

        let stream = registry.room("lobby");
        assert!(registry.contains("lobby"));
        assert_eq!(registry.room_count(), 1);

        // Second lookup returns the same instance.
        assert!(Arc::ptr_eq(&stream, &registry.room("lobby")));
    }

    #[test]
    fn test_rooms_are_isolated() {
        let registry = StreamRegistry::new();
        registry.room("x").send(ChatMessage::new("a", "only in x"));

        let (_, history) = registry.room("y").register();
        assert!(history.is_empty());

        let (_, history) = registry.room("x").register();
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_room_name_validation() {
        assert!(validate_room_name("lobby").is_ok());
        assert!(validate_room_name("eg-workspace").is_ok());
        assert!(validate_room_name("").is_err());
        assert!(validate_room_name("bad\nname").is_err());

        let long_name = "a".repeat(MAX_ROOM_NAME_LENGTH + 1);
        assert!(validate_room_name(&long_name).is_err());
    }

    #[test]
    fn test_stats() {
        let registry = StreamRegistry::new();
        registry.room("a").send(ChatMessage::new("p", "m1"));
        registry.room("a").send(ChatMessage::new("p", "m2"));
        let (_, _) = registry.room("b").register();

        let stats = registry.stats();
        assert_eq!(stats.room_count, 2);
        assert_eq!(stats.listener_count, 1);
        assert_eq!(stats.message_count, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_get_or_create_yields_one_instance() {
        let registry = Arc::new(StreamRegistry::new());

        let lookups: Vec<_> = (0..10)
            .map(|_| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move { registry.room("lobby") })
            })
            .collect();

        let mut streams = Vec::new();
        for lookup in lookups {
            streams.push(lookup.await.unwrap());
        }

        assert_eq!(registry.room_count(), 1);
        for stream in &streams[1..] {
            assert!(Arc::ptr_eq(&streams[0], stream));
        }
    }
}
