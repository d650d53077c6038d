//! LLM-backed workflow interpretation.
//!
//! Sends a workflow graph to a chat-completion service and turns the reply
//! into typed epics, features and user stories.
//!
//! ## Features
//!
//! - OpenAI chat completions and Google Gemini `generateContent`
//! - Fenced JSON extraction with defaulting of missing fields
//! - Degraded result instead of an error when the call or parse fails
//! - Markdown report generation with a locally rendered fallback

mod analyzer;
mod gemini;
mod insights;
mod openai;
mod prompts;
mod scripted;

pub use analyzer::{fallback_report, InsightAnalyzer};
pub use gemini::GeminiProvider;
pub use insights::{
    extract_json_block, parse_insights, Epic, Feature, Level, Risk, Task,
    TargetProcessImplementation, UserStory, WorkflowInsights, RAW_EXCERPT_CHARS,
};
pub use openai::OpenAIProvider;
pub use prompts::{analysis_prompt, report_prompt};
pub use scripted::ScriptedProvider;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single-turn text completion service.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Send one prompt, get the reply text.
    async fn complete(&self, prompt: &str) -> Result<String, AIError>;

    /// Get the provider name.
    fn name(&self) -> &str;
}

/// AI error types.
#[derive(Debug, thiserror::Error)]
pub enum AIError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("No response from AI")]
    NoResponse,

    #[error("No JSON block found in response")]
    MissingJsonBlock,

    #[error("Invalid JSON in response: {0}")]
    InvalidJson(String),
}

impl From<reqwest::Error> for AIError {
    fn from(e: reqwest::Error) -> Self {
        Self::ApiError(e.to_string())
    }
}

/// Supported completion services.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    OpenAI,
    Gemini,
}

impl ProviderKind {
    /// Environment variable holding this provider's API key.
    pub fn api_key_var(self) -> &'static str {
        match self {
            Self::OpenAI => "OPENAI_API_KEY",
            Self::Gemini => "GEMINI_API_KEY",
        }
    }

    /// Model used when none is configured.
    pub fn default_model(self) -> &'static str {
        match self {
            Self::OpenAI => openai::DEFAULT_MODEL,
            Self::Gemini => gemini::DEFAULT_MODEL,
        }
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "gemini" => Ok(Self::Gemini),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenAI => write!(f, "openai"),
            Self::Gemini => write!(f, "gemini"),
        }
    }
}

/// Sampling and endpoint options shared by all providers.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self { model: None, base_url: None, temperature: 0.7, max_tokens: 4000 }
    }
}

/// Build the provider for `kind`.
pub fn build_provider(
    kind: ProviderKind,
    api_key: &str,
    options: &CompletionOptions,
) -> Box<dyn CompletionProvider> {
    let model = options.model.clone().unwrap_or_else(|| kind.default_model().to_string());

    match kind {
        ProviderKind::OpenAI => {
            let mut provider = OpenAIProvider::new(api_key)
                .with_model(model)
                .with_temperature(options.temperature)
                .with_max_tokens(options.max_tokens);
            if let Some(url) = &options.base_url {
                provider = provider.with_base_url(url.as_str());
            }
            Box::new(provider)
        }
        ProviderKind::Gemini => {
            let mut provider = GeminiProvider::new(api_key)
                .with_model(model)
                .with_temperature(options.temperature)
                .with_max_tokens(options.max_tokens);
            if let Some(url) = &options.base_url {
                provider = provider.with_base_url(url.as_str());
            }
            Box::new(provider)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_parse() {
        assert_eq!("OpenAI".parse::<ProviderKind>(), Ok(ProviderKind::OpenAI));
        assert_eq!("gemini".parse::<ProviderKind>(), Ok(ProviderKind::Gemini));
        assert_eq!("claude".parse::<ProviderKind>(), Err("claude".to_string()));
    }

    #[test]
    fn test_build_provider_names() {
        let options = CompletionOptions::default();
        assert_eq!(build_provider(ProviderKind::OpenAI, "k", &options).name(), "openai");
        assert_eq!(build_provider(ProviderKind::Gemini, "k", &options).name(), "gemini");
    }

    #[test]
    fn test_api_key_vars() {
        assert_eq!(ProviderKind::OpenAI.api_key_var(), "OPENAI_API_KEY");
        assert_eq!(ProviderKind::Gemini.api_key_var(), "GEMINI_API_KEY");
    }
}
