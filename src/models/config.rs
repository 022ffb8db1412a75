use serde::Deserialize;
use std::path::Path;

use crate::error::ConfigError;

/// Application configuration, from an optional YAML file plus env overrides
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// Remote model settings
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Upload limits
    #[serde(default)]
    pub upload: UploadConfig,

    /// Session lifetime
    #[serde(default)]
    pub session: SessionConfig,

    /// Listen address for `serve`
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

/// Settings for the generative model endpoint
#[derive(Debug, Deserialize, Clone)]
pub struct GeminiConfig {
    /// API credential. Required; there is no anonymous mode.
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Sampling temperature, kept low for literal reproduction
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Whole-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_timeout() -> u64 {
    180
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            base_url: default_base_url(),
            temperature: default_temperature(),
            timeout_secs: default_timeout(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    /// Largest accepted upload body, in bytes
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

fn default_max_bytes() -> usize {
    20 * 1024 * 1024
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    /// Sessions untouched for this long are closed
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,

    /// How often expired sessions are swept
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

fn default_ttl() -> u64 {
    3600
}

fn default_sweep_interval() -> u64 {
    60
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gemini: GeminiConfig::default(),
            upload: UploadConfig::default(),
            session: SessionConfig::default(),
            bind_addr: default_bind_addr(),
        }
    }
}

impl AppConfig {
    /// Load and validate configuration for process start.
    ///
    /// Reads the YAML file if one is given, applies environment overrides,
    /// then validates. A missing API key is a fatal [`ConfigError`].
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        config.apply_env_overrides(|name| std::env::var(name).ok());
        config.validate()?;

        tracing::info!(
            model = %config.gemini.model,
            base_url = %config.gemini.base_url,
            temperature = config.gemini.temperature,
            "Loaded configuration"
        );

        Ok(config)
    }

    /// Parse a YAML configuration file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Override settings from environment variables.
    ///
    /// `API_KEY` takes precedence over `GEMINI_API_KEY`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("API_KEY").or_else(|| non_empty("GEMINI_API_KEY")) {
            self.gemini.api_key = key;
        }
        if let Some(model) = non_empty("GEMINI_MODEL") {
            self.gemini.model = model;
        }
        if let Some(url) = non_empty("GEMINI_BASE_URL") {
            self.gemini.base_url = url;
        }
        if let Some(addr) = non_empty("BIND_ADDR") {
            self.bind_addr = addr;
        }
    }

    /// Startup validation
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gemini.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        let t = self.gemini.temperature;
        if !(0.0..=2.0).contains(&t) {
            return Err(ConfigError::InvalidTemperature(t));
        }
        Ok(())
    }
}
