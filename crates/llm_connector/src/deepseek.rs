use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use retort_core::{RetortError, RetortResult};
use serde_json::{json, Value};

use crate::{CompletionProvider, CompletionRequest, CompletionResponse, LlmConfig, Usage};

/// OpenAI-compatible chat-completions client. DeepSeek is the default target.
pub struct DeepSeekProvider {
    config: LlmConfig,
    client: Client,
    api_key: String,
}

impl DeepSeekProvider {
    pub fn new(config: LlmConfig, api_key: String) -> RetortResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_s))
            .build()
            .map_err(|err| RetortError::Network(format!("failed to build client: {err}")))?;

        Ok(Self {
            config,
            client,
            api_key,
        })
    }

    /// `base_url` is the API root; the chat-completions path is appended to it.
    fn endpoint(&self) -> String {
        self.config
            .base_url
            .as_ref()
            .map(|url| format!("{}/chat/completions", url.trim_end_matches('/')))
            .unwrap_or_else(|| self.config.provider.default_endpoint().to_string())
    }
}

#[async_trait]
impl CompletionProvider for DeepSeekProvider {
    async fn complete(&self, request: CompletionRequest) -> RetortResult<CompletionResponse> {
        let payload = json!({
            "model": self.config.model,
            "messages": request.messages,
            "max_tokens": request.max_tokens.unwrap_or(self.config.max_tokens),
            "temperature": request.temperature.unwrap_or(self.config.temperature),
            "top_p": request.top_p.unwrap_or(self.config.top_p),
        });

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|err| RetortError::Upstream(format!("LLM request failed: {err}")))?;

        let status = response.status();
        let json: Value = response
            .json()
            .await
            .map_err(|err| RetortError::Upstream(format!("Failed to parse LLM response: {err}")))?;

        if !status.is_success() {
            let message = json["error"]
                .get("message")
                .and_then(Value::as_str)
                .map(|s| s.to_string());
            return Err(RetortError::Upstream(format!(
                "{} returned {status}: {}",
                self.name(),
                message.unwrap_or_else(|| json.to_string())
            )));
        }

        // A missing first candidate is an empty completion, not an error.
        let content = json
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let usage = Usage {
            prompt_tokens: json["usage"]["prompt_tokens"].as_u64().unwrap_or(0) as usize,
            completion_tokens: json["usage"]["completion_tokens"].as_u64().unwrap_or(0) as usize,
            total_tokens: json["usage"]["total_tokens"].as_u64().unwrap_or(0) as usize,
        };

        Ok(CompletionResponse { content, usage })
    }

    fn name(&self) -> &str {
        "deepseek"
    }
}
