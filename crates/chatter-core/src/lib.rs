//! # chatter-core
//!
//! Synchronized, in-memory broadcast streams with per-listener replay.
//!
//! This crate provides the fundamental building blocks:
//!
//! - **WakeLatch** - Sticky single-slot wake signal for one listener
//! - **MessageLog** - Append-only, insertion-ordered message history
//! - **ChatStream** - One room: log + listener cursors under a single lock
//! - **StreamRegistry** - Lazily-created stream per room name
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────────┐     ┌─────────────┐
//! │  Producer   │────▶│ StreamRegistry   │────▶│ ChatStream  │
//! └─────────────┘     └──────────────────┘     └─────────────┘
//!                                                     │
//!                                              ┌──────┴──────┐
//!                                              ▼             ▼
//!                                        ┌──────────┐  ┌───────────┐
//!                                        │MessageLog│  │ WakeLatch │
//!                                        └──────────┘  └───────────┘
//! ```
//!
//! Every listener replays the full history at registration, then blocks on
//! its latch until a producer appends; all listeners of one stream observe
//! the same total order.

pub mod latch;
pub mod log;
pub mod message;
pub mod registry;
pub mod stream;

pub use latch::{Wake, WakeLatch};
pub use log::MessageLog;
pub use message::ChatMessage;
pub use registry::{RegistryStats, StreamRegistry};
pub use stream::{ChatStream, ListenerId, StreamError, Subscription};
