use prometheus::{Histogram, HistogramOpts, IntCounter, Registry};
use retort_core::{RetortError, RetortResult};

use crate::MetricsSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricType {
    TotalRequests,
    RepliesGenerated,
    InvalidRequests,
    UpstreamFailures,
    Misconfigured,
    SentenceFallbacks,
    PaddingFallbacks,
}

impl MetricType {
    pub const ALL: [MetricType; 7] = [
        MetricType::TotalRequests,
        MetricType::RepliesGenerated,
        MetricType::InvalidRequests,
        MetricType::UpstreamFailures,
        MetricType::Misconfigured,
        MetricType::SentenceFallbacks,
        MetricType::PaddingFallbacks,
    ];

    fn name(self) -> &'static str {
        match self {
            MetricType::TotalRequests => "retort_requests_total",
            MetricType::RepliesGenerated => "retort_generations_total",
            MetricType::InvalidRequests => "retort_invalid_requests_total",
            MetricType::UpstreamFailures => "retort_upstream_failures_total",
            MetricType::Misconfigured => "retort_misconfigured_total",
            MetricType::SentenceFallbacks => "retort_sentence_fallbacks_total",
            MetricType::PaddingFallbacks => "retort_padding_fallbacks_total",
        }
    }

    fn help(self) -> &'static str {
        match self {
            MetricType::TotalRequests => "Generate requests received",
            MetricType::RepliesGenerated => "Reply sets returned to callers",
            MetricType::InvalidRequests => "Requests rejected before the completion call",
            MetricType::UpstreamFailures => "Completion calls that failed",
            MetricType::Misconfigured => "Requests refused because the service lacks credentials",
            MetricType::SentenceFallbacks => "Completions normalized by sentence splitting",
            MetricType::PaddingFallbacks => "Completions padded with the filler reply",
        }
    }
}

pub struct Metrics {
    counters: Vec<(MetricType, IntCounter)>,
    completion_latency: Histogram,
}

impl Metrics {
    pub fn register(registry: &Registry) -> RetortResult<Self> {
        let mut counters = Vec::with_capacity(MetricType::ALL.len());
        for metric in MetricType::ALL {
            let counter = IntCounter::new(metric.name(), metric.help()).map_err(to_config_error)?;
            registry
                .register(Box::new(counter.clone()))
                .map_err(to_config_error)?;
            counters.push((metric, counter));
        }

        let completion_latency = Histogram::with_opts(
            HistogramOpts::new(
                "retort_completion_seconds",
                "Latency of the completion call",
            )
            .buckets(vec![0.25, 0.5, 1.0, 2.0, 4.0, 8.0, 16.0, 32.0]),
        )
        .map_err(to_config_error)?;
        registry
            .register(Box::new(completion_latency.clone()))
            .map_err(to_config_error)?;

        Ok(Self {
            counters,
            completion_latency,
        })
    }

    fn counter(&self, metric: MetricType) -> Option<&IntCounter> {
        self.counters
            .iter()
            .find(|(kind, _)| *kind == metric)
            .map(|(_, counter)| counter)
    }

    pub fn increment(&self, metric: MetricType) {
        if let Some(counter) = self.counter(metric) {
            counter.inc();
        }
    }

    pub fn observe_latency(&self, seconds: f64) {
        self.completion_latency.observe(seconds);
    }

    pub fn get(&self, metric: MetricType) -> u64 {
        self.counter(metric).map(IntCounter::get).unwrap_or_default()
    }

    pub fn get_summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_requests: self.get(MetricType::TotalRequests),
            replies_generated: self.get(MetricType::RepliesGenerated),
            invalid_requests: self.get(MetricType::InvalidRequests),
            upstream_failures: self.get(MetricType::UpstreamFailures),
            fallbacks: self.get(MetricType::SentenceFallbacks)
                + self.get(MetricType::PaddingFallbacks),
        }
    }
}

fn to_config_error(err: prometheus::Error) -> RetortError {
    RetortError::Config(format!("metrics registration failed: {err}"))
}
