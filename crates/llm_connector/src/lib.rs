// crates/llm_connector/src/lib.rs

use async_trait::async_trait;
use retort_core::{RetortError, RetortResult};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub mod deepseek;

use deepseek::DeepSeekProvider;

/// Upper bound accepted for `retry_attempts`.
pub const MAX_RETRY_ATTEMPTS: u32 = 10;

/// Longest pause between two attempts.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Value shipped in sample env files; treated the same as a missing key.
pub const PLACEHOLDER_API_KEY: &str = "YOUR_API_KEY";

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub api_key_env: String,
    pub base_url: Option<String>,
    pub max_tokens: usize,
    pub temperature: f32,
    pub top_p: f32,
    pub timeout_s: u64,
    pub retry_attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    DeepSeek,
    OpenAi,
}

impl LlmProvider {
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            LlmProvider::DeepSeek => "https://api.deepseek.com/chat/completions",
            LlmProvider::OpenAi => "https://api.openai.com/v1/chat/completions",
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::DeepSeek,
            model: "deepseek-chat".to_string(),
            api_key_env: "DEEPSEEK_API_KEY".to_string(),
            base_url: None,
            max_tokens: 500,
            temperature: 0.8,
            top_p: 1.0,
            timeout_s: 30,
            retry_attempts: 1,
        }
    }
}

/// A text-completion backend. The rest of the workspace only ever talks to this trait.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> RetortResult<CompletionResponse>;
    fn name(&self) -> &str;
}

/// Completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    pub max_tokens: Option<usize>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            messages: vec![
                Message {
                    role: Role::System,
                    content: system.into(),
                },
                Message {
                    role: Role::User,
                    content: user.into(),
                },
            ],
            max_tokens: None,
            temperature: None,
            top_p: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Completion response. Only the first candidate is kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    pub usage: Usage,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

/// Reads the credential named by `env_var`, rejecting blanks and the placeholder value.
pub fn resolve_api_key(env_var: &str) -> RetortResult<String> {
    let key = std::env::var(env_var).map_err(|_| {
        RetortError::ServiceMisconfigured(format!("API key not found: {env_var}"))
    })?;

    check_api_key(env_var, &key)?;
    Ok(key.trim().to_string())
}

fn check_api_key(env_var: &str, key: &str) -> RetortResult<()> {
    let key = key.trim();
    if key.is_empty() || key == PLACEHOLDER_API_KEY {
        return Err(RetortError::ServiceMisconfigured(format!(
            "API key in {env_var} is empty or a placeholder"
        )));
    }
    Ok(())
}

/// LLM connector: provider selection plus the retry policy around a single call.
pub struct LlmConnector {
    config: LlmConfig,
    provider: Box<dyn CompletionProvider>,
}

impl LlmConnector {
    pub fn new(config: LlmConfig) -> RetortResult<Self> {
        let api_key = resolve_api_key(&config.api_key_env)?;
        let provider: Box<dyn CompletionProvider> =
            Box::new(DeepSeekProvider::new(config.clone(), api_key)?);

        Ok(Self::with_provider(config, provider))
    }

    pub fn with_provider(config: LlmConfig, provider: Box<dyn CompletionProvider>) -> Self {
        Self { config, provider }
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }
}

#[async_trait]
impl CompletionProvider for LlmConnector {
    async fn complete(&self, request: CompletionRequest) -> RetortResult<CompletionResponse> {
        let start = Instant::now();
        let max_attempts = self.config.retry_attempts.clamp(1, MAX_RETRY_ATTEMPTS);
        let mut attempts = 0;

        loop {
            match self.provider.complete(request.clone()).await {
                Ok(response) => {
                    debug!(
                        provider = self.provider.name(),
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        tokens = response.usage.total_tokens,
                        "completion finished"
                    );
                    return Ok(response);
                }
                Err(e) => {
                    attempts += 1;
                    if attempts >= max_attempts {
                        return Err(e);
                    }

                    let delay = retry_delay(attempts);
                    warn!("LLM request failed ({}), retrying in {:?}", e, delay);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    fn name(&self) -> &str {
        self.provider.name()
    }
}

/// Exponential backoff starting at 200ms, capped at `MAX_RETRY_DELAY`.
pub fn retry_delay(attempt: u32) -> Duration {
    let millis = 2u64.saturating_pow(attempt).saturating_mul(100);
    Duration::from_millis(millis).min(MAX_RETRY_DELAY)
}
