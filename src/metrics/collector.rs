//! Prometheus metrics collection
//!
//! Counters and gauges describing the matchmaking pipeline: how many
//! connections opened, how many pairings were made, and how many
//! clients are currently waiting per intent.

use crate::error::Result;
use crate::types::Intent;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder};

/// Collector owning the relay's metric families
pub struct MetricsCollector {
    registry: Registry,

    /// Total WebSocket connections accepted
    pub connections_total: IntCounter,
    /// Total connections closed
    pub disconnects_total: IntCounter,
    /// Total pairings established
    pub matches_total: IntCounterVec,
    /// Total skip events processed
    pub skips_total: IntCounter,
    /// Total join events dropped for an unknown intent
    pub unknown_intents_total: IntCounter,
    /// Currently connected clients
    pub active_connections: IntGauge,
    /// Currently waiting clients, labeled by intent
    pub waiting_connections: IntGaugeVec,
}

impl MetricsCollector {
    /// Create a collector with a fresh registry
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let connections_total = IntCounter::with_opts(Opts::new(
            "relay_connections_total",
            "Total WebSocket connections accepted",
        ))?;
        let disconnects_total = IntCounter::with_opts(Opts::new(
            "relay_disconnects_total",
            "Total WebSocket connections closed",
        ))?;
        let matches_total = IntCounterVec::new(
            Opts::new("relay_matches_total", "Total pairings established"),
            &["intent"],
        )?;
        let skips_total = IntCounter::with_opts(Opts::new(
            "relay_skips_total",
            "Total skip events processed",
        ))?;
        let unknown_intents_total = IntCounter::with_opts(Opts::new(
            "relay_unknown_intents_total",
            "Total join events dropped for an unknown intent",
        ))?;
        let active_connections = IntGauge::with_opts(Opts::new(
            "relay_active_connections",
            "Currently connected clients",
        ))?;
        let waiting_connections = IntGaugeVec::new(
            Opts::new(
                "relay_waiting_connections",
                "Clients currently waiting for a match, by intent",
            ),
            &["intent"],
        )?;

        registry.register(Box::new(connections_total.clone()))?;
        registry.register(Box::new(disconnects_total.clone()))?;
        registry.register(Box::new(matches_total.clone()))?;
        registry.register(Box::new(skips_total.clone()))?;
        registry.register(Box::new(unknown_intents_total.clone()))?;
        registry.register(Box::new(active_connections.clone()))?;
        registry.register(Box::new(waiting_connections.clone()))?;

        Ok(Self {
            registry,
            connections_total,
            disconnects_total,
            matches_total,
            skips_total,
            unknown_intents_total,
            active_connections,
            waiting_connections,
        })
    }

    /// Update the waiting gauge for one intent
    pub fn set_waiting(&self, intent: Intent, count: usize) {
        self.waiting_connections
            .with_label_values(&[intent.as_str()])
            .set(count as i64);
    }

    /// Record an established pairing under an intent
    pub fn record_match(&self, intent: Intent) {
        self.matches_total.with_label_values(&[intent.as_str()]).inc();
    }

    /// Access the underlying registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render all metric families in the Prometheus text format
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_registers_families() {
        let collector = MetricsCollector::new().unwrap();
        collector.connections_total.inc();
        collector.record_match(Intent::Hiring);
        collector.set_waiting(Intent::LookingForJob, 3);

        let rendered = collector.render().unwrap();
        assert!(rendered.contains("relay_connections_total"));
        assert!(rendered.contains("relay_matches_total"));
        assert!(rendered.contains(r#"intent="looking_for_job""#));
    }
}
