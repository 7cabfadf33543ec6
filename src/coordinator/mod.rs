//! Connection lifecycle coordination
//!
//! Bridges inbound client events (join, skip, disconnect) to the intent
//! queue registry and the transport's room primitives. Decisions are
//! pure state transitions that yield a list of effects; applying those
//! effects is the only place the transport is touched.

pub mod effects;
pub mod manager;

// Re-export commonly used types
pub use effects::Effect;
pub use manager::{CoordinatorStats, MatchCoordinator};
