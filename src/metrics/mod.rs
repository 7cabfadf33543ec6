//! Prometheus metrics for the relay service

pub mod collector;

// Re-export commonly used types
pub use collector::MetricsCollector;
