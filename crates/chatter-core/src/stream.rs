//! The synchronized broadcast stream backing one room.
//!
//! A [`ChatStream`] owns an append-only [`MessageLog`] and a table of
//! registered listeners, each with a read cursor and a [`WakeLatch`]. All
//! state is guarded by a single per-stream mutex, so an append plus the
//! fan-out of wake signals is atomic with respect to any cursor read or
//! advance. The only suspension point is [`WakeLatch::wait`], entered
//! outside the lock.

use crate::latch::{Wake, WakeLatch};
use crate::log::MessageLog;
use crate::message::ChatMessage;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, trace};

/// Identifies one registered listener on a [`ChatStream`].
///
/// Ids are issued by the stream at registration time and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// Stream errors.
#[derive(Debug, Error)]
pub enum StreamError {
    /// `poll` was called for a listener that was never registered on this
    /// stream, or whose entry has already been removed.
    #[error("unknown listener: {0}")]
    UnknownListener(ListenerId),
}

/// Per-listener state: how much of the log has been delivered, and the
/// latch used to resume its receive loop.
#[derive(Debug)]
struct ListenerEntry {
    cursor: usize,
    latch: Arc<WakeLatch>,
}

#[derive(Debug, Default)]
struct StreamState {
    log: MessageLog,
    listeners: HashMap<ListenerId, ListenerEntry>,
}

/// A synchronized, in-memory broadcast stream.
///
/// Producers append with [`send`](ChatStream::send); each consumer
/// replays the full history and then blocks for new messages, either
/// through the [`register`](ChatStream::register) /
/// [`poll`](ChatStream::poll) primitives or the higher-level
/// [`subscribe`](ChatStream::subscribe) /
/// [`receive`](ChatStream::receive) loop. All listeners of one stream
/// observe the same total order: the log append order.
#[derive(Debug, Default)]
pub struct ChatStream {
    state: Mutex<StreamState>,
    next_listener: AtomicU64,
}

impl ChatStream {
    /// Create a new, empty stream.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and wake every registered listener.
    ///
    /// The message is visible in the log before any latch is signaled, so
    /// a woken listener's next poll always observes it. Never blocks on
    /// consumers; signaling is fire-and-forget.
    pub fn send(&self, message: ChatMessage) {
        let mut state = self.state.lock();
        let length = state.log.append(message);
        for entry in state.listeners.values() {
            entry.latch.signal();
        }
        trace!(
            length,
            listeners = state.listeners.len(),
            "message appended"
        );
    }

    fn admit(&self) -> (ListenerId, Vec<Arc<ChatMessage>>, Arc<WakeLatch>) {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        let latch = Arc::new(WakeLatch::new());
        let mut state = self.state.lock();
        let history = state.log.slice_from(0);
        let cursor = state.log.len();
        state.listeners.insert(
            id,
            ListenerEntry {
                cursor,
                latch: Arc::clone(&latch),
            },
        );
        debug!(listener = %id, backlog = history.len(), "listener registered");
        (id, history, latch)
    }

    /// Register a new listener and return its id together with the full
    /// message history up to this instant.
    ///
    /// The listener's cursor starts at the current log length: a message
    /// appended concurrently is either included in the returned history or
    /// counted from the cursor onward, never both and never neither.
    #[must_use]
    pub fn register(&self) -> (ListenerId, Vec<Arc<ChatMessage>>) {
        let (id, history, _) = self.admit();
        (id, history)
    }

    /// Return the listener's unread messages and advance its cursor to the
    /// current log length.
    ///
    /// Concatenating the `register` history with every subsequent `poll`
    /// result, in call order, reproduces the log exactly once, provided
    /// polls for one listener are not issued concurrently with each other.
    ///
    /// # Errors
    ///
    /// [`StreamError::UnknownListener`] if the id was never registered
    /// here or has been removed.
    pub fn poll(&self, id: ListenerId) -> Result<Vec<Arc<ChatMessage>>, StreamError> {
        let mut guard = self.state.lock();
        let StreamState { log, listeners } = &mut *guard;
        let entry = listeners
            .get_mut(&id)
            .ok_or(StreamError::UnknownListener(id))?;
        let cursor = std::mem::replace(&mut entry.cursor, log.len());
        Ok(log.slice_from(cursor))
    }

    /// Remove a listener and close its latch, waking it if suspended.
    ///
    /// Returns `false` if the id was not registered. Removal is the normal
    /// disconnect path, not an error: a receive loop suspended in its
    /// latch observes the closure and unwinds.
    pub fn unregister(&self, id: ListenerId) -> bool {
        let removed = self.state.lock().listeners.remove(&id);
        match removed {
            Some(entry) => {
                entry.latch.close();
                debug!(listener = %id, "listener removed");
                true
            }
            None => false,
        }
    }

    /// Register a listener and return a [`Subscription`] handle that
    /// unregisters it when dropped.
    #[must_use]
    pub fn subscribe(self: Arc<Self>) -> Subscription {
        let (id, backlog, latch) = self.admit();
        Subscription {
            stream: self,
            id,
            latch,
            backlog,
        }
    }

    /// Drive a delivery loop for one consumer.
    ///
    /// Registers a listener, delivers the full history in order, then
    /// suspends until new messages arrive and delivers each batch as it
    /// becomes available. The loop runs until `deliver` returns `false`
    /// (the consumer has gone away) or the listener is unregistered; the
    /// listener entry is removed on either path.
    pub async fn receive<F>(self: Arc<Self>, mut deliver: F)
    where
        F: FnMut(Arc<ChatMessage>) -> bool,
    {
        let mut subscription = self.subscribe();
        'delivery: while let Some(batch) = subscription.next_batch().await {
            for message in batch {
                if !deliver(message) {
                    break 'delivery;
                }
            }
        }
    }

    /// Number of messages appended so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().log.len()
    }

    /// Whether no message has been appended yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().log.is_empty()
    }

    /// Number of currently registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.state.lock().listeners.len()
    }
}

/// A registered listener's handle on a stream.
///
/// Dropping the subscription removes the listener entry, so a consumer
/// that disconnects (or whose driving task is cancelled mid-wait) cannot
/// leak its cursor.
#[derive(Debug)]
pub struct Subscription {
    stream: Arc<ChatStream>,
    id: ListenerId,
    latch: Arc<WakeLatch>,
    backlog: Vec<Arc<ChatMessage>>,
}

impl Subscription {
    /// The listener id issued at registration.
    #[must_use]
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Wait for and return the next non-empty batch of unread messages.
    ///
    /// The first call yields the history captured at registration time (if
    /// any); later calls suspend on the latch and poll. Returns `None`
    /// once the listener has been unregistered.
    pub async fn next_batch(&mut self) -> Option<Vec<Arc<ChatMessage>>> {
        if !self.backlog.is_empty() {
            return Some(std::mem::take(&mut self.backlog));
        }
        loop {
            match self.latch.wait().await {
                Wake::Closed => return None,
                Wake::Signaled => match self.stream.poll(self.id) {
                    // A wakeup for messages an earlier poll already
                    // drained; keep waiting.
                    Ok(batch) if batch.is_empty() => continue,
                    Ok(batch) => return Some(batch),
                    Err(StreamError::UnknownListener(_)) => return None,
                },
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.stream.unregister(self.id);
    }
}
