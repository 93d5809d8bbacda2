//! Per-instance atomic counters exposed through the `prometheus` registry
//! the dispatcher updates and the out-of-scope `/metrics` handler scrapes.
//!
//! This crate owns the counters only — the HTTP route that encodes the
//! registry to text and the scrape-handler wiring live in `gateway-server`,
//! which is the out-of-core "metrics sink".

use prometheus::{IntCounterVec, Opts, Registry};
use std::sync::Arc;

/// Labels every counter here carries: the instance name, so dashboards can
/// slice per-instance telemetry by instance.
const INSTANCE_LABEL: &str = "instance";

/// The full set of counters the dispatcher and credential manager update.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    /// Every request the dispatcher resolves to an instance, success or
    /// failure.
    pub requests_total: IntCounterVec,
    /// Every request that ends in a `GatewayError`, labeled further by
    /// taxon.
    pub errors_total: IntCounterVec,
    /// Every successful credential refresh.
    pub credential_refresh_total: IntCounterVec,
    /// Every re-election that lands on a different strategy.
    pub credential_strategy_changes_total: IntCounterVec,
    /// Every provider-client retry attempt.
    pub retries_total: IntCounterVec,
    /// Every dispatch cancelled by caller disconnect or deadline.
    pub cancelled_total: IntCounterVec,
}

impl Metrics {
    /// Build a fresh registry and register every counter against it.
    ///
    /// # Panics
    /// Panics only if two counters are registered under the same name,
    /// which would be a programming error in this constructor itself.
    #[must_use]
    pub fn new() -> Arc<Self> {
        let registry = Registry::new();

        let requests_total = register(&registry, "gateway_requests_total", "Total dispatched requests");
        let errors_total = register_with_taxon(&registry, "gateway_errors_total", "Total dispatch errors");
        let credential_refresh_total = register(
            &registry,
            "gateway_credential_refresh_total",
            "Total successful credential refreshes",
        );
        let credential_strategy_changes_total = register(
            &registry,
            "gateway_credential_strategy_changes_total",
            "Total credential-manager re-elections that changed strategy",
        );
        let retries_total = register(&registry, "gateway_retries_total", "Total provider-client retry attempts");
        let cancelled_total = register(&registry, "gateway_cancelled_total", "Total cancelled dispatches");

        Arc::new(Self {
            registry,
            requests_total,
            errors_total,
            credential_refresh_total,
            credential_strategy_changes_total,
            retries_total,
            cancelled_total,
        })
    }

    /// Render every registered metric in the Prometheus text exposition
    /// format, for the out-of-scope `/metrics` route to return verbatim.
    ///
    /// # Errors
    /// Returns an error if the text encoder fails, which only happens on
    /// malformed metric metadata (impossible given this module's fixed
    /// registration set).
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let families = self.registry.gather();
        let mut buf = Vec::new();
        encoder.encode(&families, &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Increment `requests_total` for `instance`.
    pub fn record_request(&self, instance: &str) {
        self.requests_total.with_label_values(&[instance]).inc();
    }

    /// Increment `errors_total` for `instance`, labeled by taxon.
    pub fn record_error(&self, instance: &str, taxon: &str) {
        self.errors_total.with_label_values(&[instance, taxon]).inc();
    }

    /// Increment `credential_refresh_total` for `instance`.
    pub fn record_credential_refresh(&self, instance: &str) {
        self.credential_refresh_total.with_label_values(&[instance]).inc();
    }

    /// Increment `credential_strategy_changes_total` for `instance`.
    pub fn record_strategy_change(&self, instance: &str) {
        self.credential_strategy_changes_total.with_label_values(&[instance]).inc();
    }

    /// Increment `retries_total` for `instance`.
    pub fn record_retry(&self, instance: &str) {
        self.retries_total.with_label_values(&[instance]).inc();
    }

    /// Increment `cancelled_total` for `instance` (scenario E).
    pub fn record_cancelled(&self, instance: &str) {
        self.cancelled_total.with_label_values(&[instance]).inc();
    }
}

impl Default for Arc<Metrics> {
    fn default() -> Self {
        Metrics::new()
    }
}

fn register(registry: &Registry, name: &str, help: &str) -> IntCounterVec {
    let counter = IntCounterVec::new(Opts::new(name, help), &[INSTANCE_LABEL])
        .expect("static metric name/label set is always valid");
    registry
        .register(Box::new(counter.clone()))
        .expect("metric names in this module are registered exactly once");
    counter
}

fn register_with_taxon(registry: &Registry, name: &str, help: &str) -> IntCounterVec {
    let counter = IntCounterVec::new(Opts::new(name, help), &[INSTANCE_LABEL, "taxon"])
        .expect("static metric name/label set is always valid");
    registry
        .register(Box::new(counter.clone()))
        .expect("metric names in this module are registered exactly once");
    counter
}
