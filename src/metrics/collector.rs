//! Metrics Collector

use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::time::Duration;
use tracing::error;

/// Request metrics for the configuration API
pub struct Metrics {
    registry: Registry,
    requests_total: IntCounterVec,
    request_duration: HistogramVec,
}

impl Metrics {
    /// Create a collector with its own registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new("ccm_requests_total", "Configuration requests by operation and outcome"),
            &["operation", "outcome"],
        )?;

        let request_duration = HistogramVec::new(
            HistogramOpts::new(
                "ccm_request_duration_seconds",
                "Time spent serving configuration requests, including store round trips",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0]),
            &["operation"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(request_duration.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            request_duration,
        })
    }

    /// Record one finished request
    pub fn observe(&self, operation: &str, outcome: &str, elapsed: Duration) {
        self.requests_total
            .with_label_values(&[operation, outcome])
            .inc();
        self.request_duration
            .with_label_values(&[operation])
            .observe(elapsed.as_secs_f64());
    }

    pub fn request_count(&self, operation: &str, outcome: &str) -> u64 {
        self.requests_total
            .with_label_values(&[operation, outcome])
            .get()
    }

    /// Render all metrics in the Prometheus text format
    pub fn export_prometheus(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();

        match encoder.encode_to_string(&metric_families) {
            Ok(output) => output,
            Err(e) => {
                error!(error = %e, "Failed to encode Prometheus metrics");
                String::new()
            }
        }
    }
}
