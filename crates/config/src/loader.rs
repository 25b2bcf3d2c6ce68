// crates/config/src/loader.rs

use retort_core::{RetortError, RetortResult};
use std::path::Path;

use crate::RetortConfig;

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load_from_file(path: &Path) -> RetortResult<RetortConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RetortError::Config(format!("Failed to read config: {}", e)))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> RetortResult<RetortConfig> {
        toml::from_str(content)
            .map_err(|e| RetortError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save_to_file(path: &Path, config: &RetortConfig) -> RetortResult<()> {
        let content = toml::to_string_pretty(config)
            .map_err(|e| RetortError::Config(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)
            .map_err(|e| RetortError::Config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    pub fn load_from_env() -> RetortResult<RetortConfig> {
        Self::apply_env_overrides(RetortConfig::default(), |key| std::env::var(key).ok())
    }

    /// Applies `RETORT_*` overrides read through `lookup`.
    pub fn apply_env_overrides<F>(mut config: RetortConfig, lookup: F) -> RetortResult<RetortConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("RETORT_LOG_LEVEL") {
            config.app.log_level = level;
        }
        if let Some(host) = lookup("RETORT_API_HOST") {
            config.api.host = host;
        }
        if let Some(port) = lookup("RETORT_API_PORT") {
            config.api.port = port
                .trim()
                .parse()
                .map_err(|_| RetortError::Config("Invalid API port".to_string()))?;
        }
        if let Some(model) = lookup("RETORT_MODEL") {
            config.llm.model = model;
        }
        if let Some(base_url) = lookup("RETORT_BASE_URL") {
            config.llm.base_url = Some(base_url).filter(|url| !url.trim().is_empty());
        }

        Ok(config)
    }
}
