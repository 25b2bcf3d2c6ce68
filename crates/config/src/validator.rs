// crates/config/src/validator.rs

use retort_core::{RetortError, RetortResult};
use retort_llm_connector::MAX_RETRY_ATTEMPTS;
use tracing::warn;

use crate::RetortConfig;

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(config: &RetortConfig) -> RetortResult<()> {
        // Validate LLM settings
        if config.llm.model.trim().is_empty() {
            return Err(RetortError::Config("Model name must not be empty".to_string()));
        }
        if !(0.0..=2.0).contains(&config.llm.temperature) {
            return Err(RetortError::Config("Temperature must be 0.0-2.0".to_string()));
        }
        if !(0.0..=1.0).contains(&config.llm.top_p) || config.llm.top_p == 0.0 {
            return Err(RetortError::Config("top_p must be in (0.0, 1.0]".to_string()));
        }
        if config.llm.max_tokens == 0 {
            return Err(RetortError::Config("max_tokens must be > 0".to_string()));
        }
        if config.llm.timeout_s == 0 {
            return Err(RetortError::Config("timeout_s must be > 0".to_string()));
        }
        if config.llm.retry_attempts == 0 {
            return Err(RetortError::Config("retry_attempts must be >= 1".to_string()));
        }
        if config.llm.retry_attempts > MAX_RETRY_ATTEMPTS {
            return Err(RetortError::Config(format!(
                "retry_attempts must be <= {MAX_RETRY_ATTEMPTS}"
            )));
        }
        if config.llm.api_key_env.trim().is_empty() {
            return Err(RetortError::Config("api_key_env must name a variable".to_string()));
        }
        if config.llm.retry_attempts > 1 {
            warn!(
                "retry_attempts = {}; failed generations will be retried",
                config.llm.retry_attempts
            );
        }

        // Validate API settings
        if config.api.enabled && config.api.port == 0 {
            return Err(RetortError::Config("Invalid API port".to_string()));
        }

        if config.history.capacity == 0 {
            return Err(RetortError::Config("History capacity must be > 0".to_string()));
        }

        Ok(())
    }
}
