// crates/observability/src/lib.rs

use prometheus::{Encoder, Registry, TextEncoder};
use retort_core::{RetortError, RetortResult};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::debug;

pub mod metrics;

use metrics::{MetricType, Metrics};

/// Metrics collector
pub struct MetricsCollector {
    registry: Registry,
    metrics: Metrics,
    start_time: Instant,
}

impl MetricsCollector {
    pub fn new() -> RetortResult<Self> {
        let registry = Registry::new();
        let metrics = Metrics::register(&registry)?;

        Ok(Self {
            registry,
            metrics,
            start_time: Instant::now(),
        })
    }

    pub fn increment(&self, metric: MetricType) {
        self.metrics.increment(metric);
    }

    pub fn record_completion(&self, latency: Duration) {
        debug!("completion took {:?}", latency);
        self.metrics.observe_latency(latency.as_secs_f64());
    }

    pub fn get(&self, metric: MetricType) -> u64 {
        self.metrics.get(metric)
    }

    pub fn get_prometheus_metrics(&self) -> RetortResult<String> {
        let encoder = TextEncoder::new();
        let mut buffer = vec![];
        encoder
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| RetortError::Config(format!("failed to encode metrics: {e}")))?;
        String::from_utf8(buffer)
            .map_err(|e| RetortError::Config(format!("metrics are not UTF-8: {e}")))
    }

    pub fn get_health_status(&self) -> HealthStatus {
        HealthStatus {
            healthy: true,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            metrics: self.metrics.get_summary(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub healthy: bool,
    pub uptime_seconds: u64,
    pub version: String,
    pub metrics: MetricsSummary,
}

#[derive(Debug, Serialize)]
pub struct MetricsSummary {
    pub total_requests: u64,
    pub replies_generated: u64,
    pub invalid_requests: u64,
    pub upstream_failures: u64,
    pub fallbacks: u64,
}
