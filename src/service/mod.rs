//! Service layer for the relay
//!
//! Contains the application state, the HTTP/WebSocket surface, and
//! health reporting.

pub mod app;
pub mod health;
pub mod http;

pub use app::AppState;
pub use health::{HealthCheck, HealthStatus};
