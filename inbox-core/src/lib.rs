//! # inbox-core
//!
//! Pure logic for inbox-sync (no I/O, instant tests).
//!
//! This crate implements the state machine and bookkeeping for inbox
//! synchronization without any network or disk I/O.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. This enables:
//! - Instant unit tests (no mocks, no async)
//! - Deterministic behavior (same input → same output)
//! - Easy reasoning about state transitions
//!
//! The actual I/O (push channel, REST calls, credential storage) is performed
//! by `inbox-client`, which interprets the actions produced here.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod echo;
pub mod inbox;
pub mod state;

pub use echo::{EchoFilter, LocalChange, DEFAULT_ECHO_CAPACITY};
pub use inbox::InboxView;
pub use state::{Action, ChannelEvent, ChannelState, Event};
