// crates/api/src/handlers.rs

use retort_core::{GenerationRequest, IntensityLevel, ReplySet, RetortError, RetortResult};
use retort_observability::{metrics::MetricType, HealthStatus, MetricsCollector};
use retort_rebuttal::{NormalizationTier, RebuttalGenerator};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::history::{HistoryEntry, HistoryStore};
use crate::GenerateRequest;

pub struct ApiHandlers {
    generator: RebuttalGenerator,
    metrics: Arc<MetricsCollector>,
    history: HistoryStore,
}

impl ApiHandlers {
    pub fn new(
        generator: RebuttalGenerator,
        metrics: Arc<MetricsCollector>,
        history_capacity: usize,
    ) -> Self {
        Self {
            generator,
            metrics,
            history: HistoryStore::new(history_capacity),
        }
    }

    pub async fn generate(&self, body: GenerateRequest) -> RetortResult<ReplySet> {
        self.metrics.increment(MetricType::TotalRequests);

        let result = self.run_generation(body).await;
        match &result {
            Ok(_) => self.metrics.increment(MetricType::RepliesGenerated),
            Err(RetortError::InvalidRequest(reason)) => {
                debug!("Rejected generate request: {}", reason);
                self.metrics.increment(MetricType::InvalidRequests);
            }
            Err(RetortError::ServiceMisconfigured(reason)) => {
                warn!("Generate request refused: {}", reason);
                self.metrics.increment(MetricType::Misconfigured);
            }
            Err(_) => self.metrics.increment(MetricType::UpstreamFailures),
        }

        result
    }

    /// Counts a body that could not be decoded, then hands back the error to return.
    pub fn reject_malformed(&self, reason: String) -> RetortError {
        self.metrics.increment(MetricType::TotalRequests);
        self.metrics.increment(MetricType::InvalidRequests);
        debug!("Rejected malformed generate body: {}", reason);
        RetortError::InvalidRequest(reason)
    }

    async fn run_generation(&self, body: GenerateRequest) -> RetortResult<ReplySet> {
        let request = parse_request(body)?;
        let rebuttal = self.generator.generate_for(&request).await?;

        self.metrics.record_completion(rebuttal.latency);
        match rebuttal.tier {
            NormalizationTier::Lines => {}
            NormalizationTier::Sentences => self.metrics.increment(MetricType::SentenceFallbacks),
            NormalizationTier::Padded => self.metrics.increment(MetricType::PaddingFallbacks),
        }

        info!(
            intensity = request.intensity().get(),
            latency_ms = rebuttal.latency.as_millis() as u64,
            tokens = rebuttal.usage.total_tokens,
            "Generated reply set"
        );

        self.history.record(rebuttal.replies.clone());
        Ok(rebuttal.replies)
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history.list()
    }

    pub fn clear_history(&self) {
        self.history.clear();
    }

    pub fn get_metrics(&self) -> RetortResult<String> {
        self.metrics.get_prometheus_metrics()
    }

    pub fn health(&self) -> HealthStatus {
        self.metrics.get_health_status()
    }

    pub fn is_configured(&self) -> bool {
        self.generator.is_configured()
    }
}

/// `input` must be a JSON string; a missing or non-numeric `intensity` means the default level.
fn parse_request(body: GenerateRequest) -> RetortResult<GenerationRequest> {
    let utterance = match body.input {
        Some(Value::String(text)) => text,
        _ => {
            return Err(RetortError::InvalidRequest(
                "input must be a non-empty string".to_string(),
            ))
        }
    };

    let intensity = body
        .intensity
        .as_ref()
        .and_then(Value::as_f64)
        .map(IntensityLevel::from_f64)
        .unwrap_or_default();

    GenerationRequest::new(&utterance, intensity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(input: Value, intensity: Value) -> GenerateRequest {
        serde_json::from_value(json!({ "input": input, "intensity": intensity })).unwrap()
    }

    #[test]
    fn parses_well_formed_body() {
        let request = parse_request(body(json!(" 你怎么这么笨 "), json!(9))).unwrap();
        assert_eq!(request.utterance(), "你怎么这么笨");
        assert_eq!(request.intensity().get(), 9);
    }

    #[test]
    fn non_string_input_is_invalid() {
        for input in [json!(42), json!(null), json!(["a"]), json!({"text": "a"})] {
            let err = parse_request(body(input, json!(5))).unwrap_err();
            assert!(matches!(err, RetortError::InvalidRequest(_)));
        }
    }

    #[test]
    fn intensity_is_clamped_or_defaulted() {
        let clamped = parse_request(body(json!("x"), json!(99))).unwrap();
        assert_eq!(clamped.intensity().get(), 10);

        let fractional = parse_request(body(json!("x"), json!(2.7))).unwrap();
        assert_eq!(fractional.intensity().get(), 2);

        let defaulted = parse_request(body(json!("x"), json!("loud"))).unwrap();
        assert_eq!(defaulted.intensity(), IntensityLevel::default());

        let missing: GenerateRequest = serde_json::from_value(json!({ "input": "x" })).unwrap();
        assert_eq!(
            parse_request(missing).unwrap().intensity(),
            IntensityLevel::default()
        );
    }
}
