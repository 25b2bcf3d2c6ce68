// src/app.rs
use retort_api::{ApiHandlers, ApiServer};
use retort_config::RetortConfig;
use retort_core::{IntensityLevel, ReplySet, RetortError, RetortResult};
use retort_llm_connector::LlmConnector;
use retort_observability::MetricsCollector;
use retort_rebuttal::{GenerationSettings, RebuttalGenerator};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

pub struct RetortApp {
    config: RetortConfig,
    generator: RebuttalGenerator,
    metrics: Arc<MetricsCollector>,
}

impl RetortApp {
    pub fn new(config: RetortConfig) -> RetortResult<Self> {
        info!("Initializing retort components...");

        let metrics = Arc::new(MetricsCollector::new()?);
        let generator = build_generator(&config)?;

        Ok(Self {
            config,
            generator,
            metrics,
        })
    }

    pub fn generator(&self) -> &RebuttalGenerator {
        &self.generator
    }

    /// One-shot generation, bypassing the HTTP layer.
    pub async fn generate_once(&self, utterance: &str, intensity: i64) -> RetortResult<ReplySet> {
        self.generator
            .generate(utterance, IntensityLevel::new(intensity))
            .await
    }

    pub async fn run(&self) -> RetortResult<()> {
        if !self.config.api.enabled {
            warn!("API disabled in configuration, nothing to serve");
            return Ok(());
        }

        let handlers = Arc::new(ApiHandlers::new(
            self.generator.clone(),
            self.metrics.clone(),
            self.config.history.capacity,
        ));
        let server = ApiServer::new(self.config.api.clone(), handlers)
            .with_metrics(self.config.metrics.enabled);

        info!("Starting retort API...");
        server.serve_with_shutdown(wait_for_shutdown()).await
    }
}

/// A missing credential does not stop the server; requests report it instead.
fn build_generator(config: &RetortConfig) -> RetortResult<RebuttalGenerator> {
    let settings = GenerationSettings {
        temperature: config.llm.temperature,
        max_tokens: config.llm.max_tokens,
    };

    match LlmConnector::new(config.llm.clone()) {
        Ok(connector) => {
            info!(
                "Using {:?} model {} for completions",
                config.llm.provider, config.llm.model
            );
            Ok(RebuttalGenerator::new(Arc::new(connector), settings))
        }
        Err(RetortError::ServiceMisconfigured(reason)) => {
            warn!("Completion service not configured: {}", reason);
            Ok(RebuttalGenerator::unconfigured(reason, settings))
        }
        Err(e) => Err(e),
    }
}

async fn wait_for_shutdown() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal"),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }
}
