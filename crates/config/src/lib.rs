// crates/config/src/lib.rs

use parking_lot::RwLock;
use retort_core::RetortResult;
use retort_llm_connector::LlmConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

pub mod loader;
pub mod validator;

pub use loader::ConfigLoader;
pub use validator::ConfigValidator;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RetortConfig {
    pub app: AppConfig,
    pub llm: LlmConfig,
    pub api: ApiConfig,
    pub history: HistoryConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub cors_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_enabled: true,
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { capacity: 10 }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Owns the active configuration. Updates are validated before they are kept.
pub struct ConfigManager {
    config_path: PathBuf,
    config: Arc<RwLock<RetortConfig>>,
}

impl ConfigManager {
    pub fn new(config_path: impl AsRef<Path>) -> RetortResult<Self> {
        let config_path = config_path.as_ref().to_path_buf();
        let config = ConfigLoader::load_from_file(&config_path)?;
        let config = ConfigLoader::apply_env_overrides(config, |key| std::env::var(key).ok())?;

        ConfigValidator::validate(&config)?;
        info!("Loaded configuration from {}", config_path.display());

        Ok(Self {
            config_path,
            config: Arc::new(RwLock::new(config)),
        })
    }

    pub fn with_defaults() -> Self {
        Self {
            config_path: PathBuf::from("config/retort.toml"),
            config: Arc::new(RwLock::new(RetortConfig::default())),
        }
    }

    /// Loads `path` if it exists, otherwise starts from defaults plus environment overrides.
    pub fn load_or_default(path: impl AsRef<Path>) -> RetortResult<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::new(path);
        }

        info!("No config at {}, using defaults", path.display());
        let config = ConfigLoader::load_from_env()?;
        ConfigValidator::validate(&config)?;

        Ok(Self {
            config_path: path.to_path_buf(),
            config: Arc::new(RwLock::new(config)),
        })
    }

    pub fn get(&self) -> RetortConfig {
        self.config.read().clone()
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    pub fn update<F>(&self, f: F) -> RetortResult<()>
    where
        F: FnOnce(&mut RetortConfig),
    {
        let mut candidate = self.config.read().clone();
        f(&mut candidate);

        ConfigValidator::validate(&candidate)?;
        *self.config.write() = candidate;

        Ok(())
    }

    pub fn save(&self) -> RetortResult<()> {
        let config = self.config.read();
        ConfigLoader::save_to_file(&self.config_path, &config)
    }
}
