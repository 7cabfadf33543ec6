//! Error types for the relay service
//!
//! Matchmaking itself has no error surface by design: unknown intents
//! and stale cleanup are silent no-ops, and notification delivery is
//! fire-and-forget. The variants here cover the service edges only.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for service-level failures
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Transport error: {message}")]
    Transport { message: String },
}
