//! Optimistic write protocols.
//!
//! Every write is a watch/check/commit cycle against the store:
//! - Watch the keys the decision depends on
//! - Re-read them and fail terminally on a real uniqueness violation
//! - Buffer the writes and commit them atomically
//! - Start over with fresh state if a watched key changed
//!
//! The first committer wins. Losers never see the conflict, only the state
//! the winner left behind.

pub mod allocator;
mod coordinator;
mod retry;

pub use coordinator::Coordinator;
