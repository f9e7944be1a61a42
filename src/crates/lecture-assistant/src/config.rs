//! Configuration for lecture-server
//!
//! Loaded from `lecture-assistant.toml`; every section and field has a
//! default, so an empty file (or no file) is a valid configuration. API keys
//! and the listen address can be overridden from the environment.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(toml::de::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins; empty allows any origin
    pub cors_origins: Vec<String>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            cors_origins: vec!["http://localhost:5173".to_string(), "http://localhost:3000".to_string()],
        }
    }
}

/// Where checkpoints are kept
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process memory; runs are lost on restart
    #[default]
    Memory,
    /// One JSON file per run under `storage.path`
    File,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    pub backend: StorageBackend,
    pub path: PathBuf,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            path: PathBuf::from("data/checkpoints"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            temperature: 0.0,
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSection {
    pub api_key: String,
    pub base_url: String,
    /// Results requested per query
    pub max_results: usize,
    pub timeout_secs: u64,
    /// Timeout for fetching source pages during verification
    pub fetch_timeout_secs: u64,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: crate::clients::search::TAVILY_BASE_URL.to_string(),
            max_results: 3,
            timeout_secs: 60,
            fetch_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditSection {
    pub enabled: bool,
    pub dir: PathBuf,
}

impl Default for AuditSection {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: PathBuf::from("logs"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptsSection {
    /// Directory of `<name>.txt` template overrides
    pub dir: Option<PathBuf>,
}

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSection,
    pub storage: StorageSection,
    pub llm: LlmSection,
    pub search: SearchSection,
    pub audit: AuditSection,
    pub prompts: PromptsSection,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::ReadError)?;
        Self::from_toml(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::ParseError)
    }

    /// Load configuration from the default locations
    ///
    /// Searches for config in:
    /// 1. CONFIG_PATH environment variable
    /// 2. ./config/lecture-assistant.toml
    /// 3. ./lecture-assistant.toml
    ///
    /// Falls back to defaults when no file exists.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(config_path) = std::env::var("CONFIG_PATH") {
            return Self::from_file(config_path);
        }

        let paths = [
            PathBuf::from("config/lecture-assistant.toml"),
            PathBuf::from("./lecture-assistant.toml"),
        ];
        for path in &paths {
            if path.exists() {
                tracing::info!(path = %path.display(), "Loading configuration");
                return Self::from_file(path);
            }
        }

        tracing::info!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Apply overrides from a variable lookup
    ///
    /// Empty values are ignored. `PORT` must parse as a port number.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(key) = get("OPENAI_API_KEY") {
            self.llm.api_key = key;
        }
        if let Some(model) = get("OPENAI_MODEL") {
            self.llm.model = model;
        }
        if let Some(url) = get("OPENAI_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Some(key) = get("TAVILY_API_KEY") {
            self.search.api_key = key;
        }
        if let Some(host) = get("HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidConfig(format!("PORT is not a valid port: {port}")))?;
        }
        Ok(())
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Check the settings the server cannot run without
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.api_key.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "llm.api_key is not set (or set OPENAI_API_KEY)".to_string(),
            ));
        }
        if self.search.api_key.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "search.api_key is not set (or set TAVILY_API_KEY)".to_string(),
            ));
        }
        if self.search.max_results == 0 {
            return Err(ConfigError::InvalidConfig("search.max_results must be at least 1".to_string()));
        }
        Ok(())
    }
}
