//! Health reporting for the relay service

use crate::coordinator::CoordinatorStats;
use crate::service::app::AppState;
use serde::Serialize;

/// Health check status
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Detailed health and statistics report
#[derive(Debug, Clone, Serialize)]
pub struct HealthCheck {
    /// Overall service status
    pub status: HealthStatus,
    /// Service name
    pub service: String,
    /// Crate version
    pub version: String,
    /// Current timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Seconds since startup
    pub uptime_seconds: u64,
    /// Coordinator statistics
    pub stats: CoordinatorStats,
}

impl HealthCheck {
    /// Gather a report from the running service
    pub fn check(state: &AppState) -> Self {
        Self {
            status: HealthStatus::Healthy,
            service: state.config().service.name.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: crate::utils::current_timestamp(),
            uptime_seconds: state.uptime_seconds(),
            stats: state.coordinator().stats(),
        }
    }
}
