//! Intent Relay - real-time peer matchmaking over WebSocket
//!
//! Clients declare an intent (hiring, looking_for_job,
//! project_teammate) and the relay pairs each new client with the
//! longest-waiting client of the same intent, notifying both sides so
//! they can establish a direct peer session.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod metrics;
pub mod protocol;
pub mod queue;
pub mod service;
pub mod transport;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{RelayError, Result};
pub use types::*;

// Re-export key components
pub use coordinator::MatchCoordinator;
pub use queue::IntentQueueRegistry;
pub use transport::{Transport, WsTransport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
