//! Conversation service client.
//!
//! - `service` - the `ConversationService` seam and its HTTP implementation
//! - `workspace` - per-call workspace resolution and the "not configured" guard
//! - `runtime` - `ConversationRuntime::converse`, one turn in, one reply out
//!
//! The relay never retries or times out a call: a failed turn is reported to
//! the caller and the next turn starts fresh.

pub mod runtime;
pub mod service;
pub mod workspace;

pub use runtime::{ConversationRuntime, Exchange};
pub use service::{ConversationService, HttpConversationService};
pub use workspace::{WorkspaceSource, CONFIGURATION_INSTRUCTIONS};
