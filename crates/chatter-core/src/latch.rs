//! Wake latch: the suspend/resume primitive behind a listener's receive loop.
//!
//! A latch carries at most one pending wakeup. Signaling an idle latch
//! stores the wakeup; signaling it again before the listener waits changes
//! nothing. A listener that waits on a signaled latch resumes immediately,
//! so a signal racing the suspension is never lost.

use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

/// Outcome of a [`WakeLatch::wait`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    /// A producer signaled the latch; unread messages may be pending.
    Signaled,
    /// The latch was closed; the listener should stop waiting.
    Closed,
}

/// A sticky, single-slot wake signal for one listener.
///
/// At most one task may wait on a latch at a time (each listener owns its
/// own latch). Any number of tasks may signal it concurrently.
#[derive(Debug, Default)]
pub struct WakeLatch {
    notify: Notify,
    closed: AtomicBool,
}

impl WakeLatch {
    /// Create a new latch with no pending wakeup.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wake the waiting listener, or store a pending wakeup if it is not
    /// currently suspended. Never blocks; repeated signals collapse into
    /// one pending wakeup.
    pub fn signal(&self) {
        self.notify.notify_one();
    }

    /// Close the latch permanently.
    ///
    /// A suspended waiter resumes with [`Wake::Closed`]; later `wait` calls
    /// return [`Wake::Closed`] without suspending.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        // The stored permit guarantees a waiter that has passed the closed
        // check but not yet suspended still wakes up.
        self.notify.notify_one();
    }

    /// Whether the latch has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Suspend until signaled, or return immediately if a wakeup is
    /// already pending.
    pub async fn wait(&self) -> Wake {
        if self.is_closed() {
            return Wake::Closed;
        }
        self.notify.notified().await;
        if self.is_closed() {
            Wake::Closed
        } else {
            Wake::Signaled
        }
    }
}
