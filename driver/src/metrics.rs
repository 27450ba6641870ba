//! # Prometheus Metrics
//!
//! Counters for a scenario run: vault calls by method and outcome, and
//! events committed to the vault's log. Rendered once at the end of a run
//! in the Prometheus text exposition format.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`] so they
//! do not collide with any default global registry consumers.

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Outcome label for a call that succeeded.
pub const OUTCOME_OK: &str = "ok";

/// Holds all Prometheus metric handles for the driver.
#[derive(Clone)]
pub struct DriverMetrics {
    registry: Registry,
    /// Vault calls, labelled by ABI method and outcome (`ok` or error kind).
    pub calls_total: IntCounterVec,
    /// Events appended to the vault's log.
    pub events_committed_total: IntCounter,
    /// Scenario steps executed.
    pub steps_total: IntCounter,
}

impl DriverMetrics {
    /// Creates and registers all metrics.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("gamevault".into()), None)?;

        let calls_total = IntCounterVec::new(
            Opts::new("calls_total", "Vault calls by method and outcome"),
            &["method", "outcome"],
        )?;
        registry.register(Box::new(calls_total.clone()))?;

        let events_committed_total = IntCounter::new(
            "events_committed_total",
            "Events appended to the vault event log",
        )?;
        registry.register(Box::new(events_committed_total.clone()))?;

        let steps_total = IntCounter::new("scenario_steps_total", "Scenario steps executed")?;
        registry.register(Box::new(steps_total.clone()))?;

        Ok(Self {
            registry,
            calls_total,
            events_committed_total,
            steps_total,
        })
    }

    /// Records one vault call.
    pub fn record_call(&self, method: &str, outcome: &str) {
        self.calls_total.with_label_values(&[method, outcome]).inc();
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
