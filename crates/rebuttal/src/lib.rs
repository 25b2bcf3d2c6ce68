// crates/rebuttal/src/lib.rs

use retort_core::{GenerationRequest, IntensityLevel, ReplySet, RetortError, RetortResult};
use retort_llm_connector::{CompletionProvider, CompletionRequest, Usage};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

pub mod normalizer;
pub mod prompt_builder;
pub mod tone;

pub use normalizer::{NormalizationTier, ResponseNormalizer, DEFAULT_FILLER_REPLY};
pub use prompt_builder::{PromptBuilder, PromptPair};
pub use tone::{tone_descriptor, TONE_DESCRIPTORS};

/// Sampling parameters sent with every completion call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub max_tokens: usize,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.8,
            max_tokens: 500,
        }
    }
}

/// Result of one generation, with enough detail for logging and metrics.
#[derive(Debug, Clone)]
pub struct Rebuttal {
    pub replies: ReplySet,
    pub tier: NormalizationTier,
    pub usage: Usage,
    pub latency: Duration,
}

/// Prompt building, one completion call and normalization, in that order.
#[derive(Clone)]
pub struct RebuttalGenerator {
    provider: Option<Arc<dyn CompletionProvider>>,
    misconfiguration: Option<String>,
    settings: GenerationSettings,
    prompt_builder: PromptBuilder,
    normalizer: ResponseNormalizer,
}

impl RebuttalGenerator {
    pub fn new(provider: Arc<dyn CompletionProvider>, settings: GenerationSettings) -> Self {
        Self {
            provider: Some(provider),
            misconfiguration: None,
            settings,
            prompt_builder: PromptBuilder::new(),
            normalizer: ResponseNormalizer::new(),
        }
    }

    /// A generator whose completion service could not be set up. Every call reports
    /// `reason` as a configuration error after request validation.
    pub fn unconfigured(reason: impl Into<String>, settings: GenerationSettings) -> Self {
        Self {
            provider: None,
            misconfiguration: Some(reason.into()),
            settings,
            prompt_builder: PromptBuilder::new(),
            normalizer: ResponseNormalizer::new(),
        }
    }

    pub fn with_normalizer(mut self, normalizer: ResponseNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn with_prompt_builder(mut self, prompt_builder: PromptBuilder) -> Self {
        self.prompt_builder = prompt_builder;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    pub async fn generate(
        &self,
        utterance: &str,
        intensity: IntensityLevel,
    ) -> RetortResult<ReplySet> {
        let request = GenerationRequest::new(utterance, intensity)?;
        Ok(self.generate_for(&request).await?.replies)
    }

    pub async fn generate_for(&self, request: &GenerationRequest) -> RetortResult<Rebuttal> {
        let provider = self.provider.as_ref().ok_or_else(|| {
            RetortError::ServiceMisconfigured(
                self.misconfiguration
                    .clone()
                    .unwrap_or_else(|| "completion service not configured".to_string()),
            )
        })?;

        let prompts = self.prompt_builder.build(request);
        debug!(
            intensity = request.intensity().get(),
            tone = tone_descriptor(request.intensity()),
            "built rebuttal prompt"
        );

        let completion = CompletionRequest::new(prompts.system, prompts.user)
            .with_temperature(self.settings.temperature)
            .with_max_tokens(self.settings.max_tokens);

        let start = Instant::now();
        let response = provider.complete(completion).await.map_err(|e| {
            error!("Completion via {} failed: {}", provider.name(), e);
            match e {
                e @ RetortError::ServiceMisconfigured(_) => e,
                other => RetortError::Upstream(other.to_string()),
            }
        })?;
        let latency = start.elapsed();

        let normalized = self.normalizer.normalize_detailed(&response.content);
        match normalized.tier {
            NormalizationTier::Lines => {}
            NormalizationTier::Sentences => {
                warn!("Completion had too few lines, used sentence split")
            }
            NormalizationTier::Padded => {
                warn!(
                    raw_len = response.content.len(),
                    "Completion had too little usable text, padded with filler"
                )
            }
        }

        Ok(Rebuttal {
            replies: normalized.replies,
            tier: normalized.tier,
            usage: response.usage,
            latency,
        })
    }
}
