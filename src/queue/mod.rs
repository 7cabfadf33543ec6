//! Intent queue engine for the relay
//!
//! One FIFO waiting list per intent category, with atomic pair-or-wait
//! semantics. Pure in-memory state with no I/O; the coordinator owns
//! the locking discipline around it.

pub mod registry;

// Re-export commonly used types
pub use registry::IntentQueueRegistry;
