//! Configuration management for boardflow.
//!
//! Non-secret settings come from an optional TOML file; credentials come
//! only from the environment and are validated before any network call.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ai::{CompletionOptions, ProviderKind};
use crate::graph::InsightThresholds;

/// Local config file name, looked up in the current directory.
pub const LOCAL_CONFIG_FILE: &str = ".boardflow.toml";

/// Errors raised while assembling configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    MissingVar(&'static str),

    #[error("Invalid project ID '{0}': expected a non-negative integer")]
    InvalidProjectId(String),

    #[error("Unknown AI provider '{0}' (expected 'openai' or 'gemini')")]
    UnknownProvider(String),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Whiteboard settings
    pub board: BoardConfig,

    /// LLM settings
    pub ai: AiConfig,

    /// Ticketing settings
    pub ticketing: TicketingConfig,

    /// Insight thresholds
    pub analysis: InsightThresholds,

    /// Artifact output
    pub output: OutputConfig,

    /// HTTP server settings
    pub server: ServerSection,
}

/// Whiteboard API settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// API base URL
    pub base_url: String,

    /// Board analyzed when none is given
    pub default_board_id: Option<String>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self { base_url: crate::board::DEFAULT_BASE_URL.to_string(), default_board_id: None }
    }
}

/// LLM settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// "openai" or "gemini"
    pub provider: String,

    /// Model override (provider default when unset)
    pub model: Option<String>,

    /// API base URL override
    pub base_url: Option<String>,

    pub temperature: f32,

    pub max_tokens: u32,
}

impl Default for AiConfig {
    fn default() -> Self {
        let options = CompletionOptions::default();
        Self {
            provider: ProviderKind::default().to_string(),
            model: None,
            base_url: None,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        }
    }
}

impl AiConfig {
    /// Parse the configured provider name.
    pub fn provider_kind(&self) -> Result<ProviderKind, ConfigError> {
        self.provider.parse().map_err(ConfigError::UnknownProvider)
    }

    /// Options handed to the provider.
    pub fn completion_options(&self) -> CompletionOptions {
        CompletionOptions {
            model: self.model.clone(),
            base_url: self.base_url.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

/// Ticketing API settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TicketingConfig {
    /// Used when `TARGET_API_BASE_URL` is not set
    pub base_url: Option<String>,
}

/// Artifact output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { dir: PathBuf::from("./output") }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
    pub cors_enabled: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 3000, cors_enabled: false }
    }
}

impl Config {
    /// Load configuration from the default locations.
    ///
    /// Looks for config in:
    /// 1. `.boardflow.toml` in current directory
    /// 2. `<config dir>/boardflow/config.toml`
    /// 3. Falls back to defaults
    pub fn load() -> Result<Self, ConfigError> {
        match Self::locate() {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Path of the config file [`Config::load`] would read, if any.
    pub fn locate() -> Option<PathBuf> {
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            return Some(local);
        }

        Self::config_dir().map(|dir| dir.join("config.toml")).filter(|path| path.exists())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        toml::from_str(&content)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// Get the config directory path.
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("boardflow"))
    }

    /// Apply environment overrides (`PORT`, `MIRO_BOARD_ID`).
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(port) = lookup("PORT").and_then(|p| p.trim().parse().ok()) {
            self.server.port = port;
        }
        if let Some(board_id) = lookup("MIRO_BOARD_ID").filter(|b| !b.is_empty()) {
            self.board.default_board_id = Some(board_id);
        }
        self
    }
}

/// Secrets and endpoints read from the environment.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub miro_token: String,
    pub ai_key: String,
    pub ticketing_base_url: String,
    pub ticketing_token: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("miro_token", &"***")
            .field("ai_key", &"***")
            .field("ticketing_base_url", &self.ticketing_base_url)
            .field("ticketing_token", &"***")
            .finish()
    }
}

impl Credentials {
    /// Read credentials through `lookup`, failing on the first missing one.
    pub fn from_lookup(
        provider: ProviderKind,
        ticketing: &TicketingConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let require = |name: &'static str| {
            lookup(name).filter(|v| !v.trim().is_empty()).ok_or(ConfigError::MissingVar(name))
        };

        let miro_token = require("MIRO_ACCESS_TOKEN")?;
        let ai_key = require(provider.api_key_var())?;
        let ticketing_base_url = require("TARGET_API_BASE_URL")
            .or_else(|e| ticketing.base_url.clone().filter(|u| !u.is_empty()).ok_or(e))?;
        let ticketing_token = require("TARGET_API_ACCESS_TOKEN")?;

        Ok(Self { miro_token, ai_key, ticketing_base_url, ticketing_token })
    }
}

/// Validated configuration plus credentials; immutable once built.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: Config,
    pub provider: ProviderKind,
    pub credentials: Credentials,
    /// `PROJECT_ID`, used when a run names no project
    pub default_project_id: Option<u64>,
}

impl Settings {
    /// Validate `config` and read credentials through `lookup`.
    pub fn from_config(
        config: Config,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let provider = config.ai.provider_kind()?;
        let credentials = Credentials::from_lookup(provider, &config.ticketing, &lookup)?;
        let default_project_id = parse_project_id(lookup("PROJECT_ID").as_deref())?;
        Ok(Self { config, provider, credentials, default_project_id })
    }

    /// Validate `config` against the process environment.
    pub fn from_env(config: Config) -> Result<Self, ConfigError> {
        Self::from_config(config, env_lookup)
    }
}

/// Read a process environment variable.
pub fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Parse a project ID; `None` or empty means "not configured".
pub fn parse_project_id(raw: Option<&str>) -> Result<Option<u64>, ConfigError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s.parse().map(Some).map_err(|_| ConfigError::InvalidProjectId(s.to_string())),
    }
}
