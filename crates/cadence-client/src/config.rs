//! Collaborator configuration.
//!
//! Each collaborator is optional. A missing API key leaves that
//! collaborator unconfigured, and callers take their fallback path.
//! Base URLs default to the public endpoints and can be pointed at a
//! local mock server for testing.

use url::Url;

/// Default model for every judgment call.
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-haiku-4-5-20251001";

/// Anthropic Messages API settings.
#[derive(Clone)]
pub struct AnthropicConfig {
    pub base_url: Url,
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for AnthropicConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl AnthropicConfig {
    pub fn new(base_url: Url, api_key: impl Into<String>) -> Self {
        Self {
            base_url,
            api_key: api_key.into(),
            model: DEFAULT_ANTHROPIC_MODEL.to_string(),
            timeout_secs: 30,
        }
    }
}

/// OpenAI image generation settings.
#[derive(Clone)]
pub struct OpenAiConfig {
    pub base_url: Url,
    pub api_key: String,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl OpenAiConfig {
    pub fn new(base_url: Url, api_key: impl Into<String>) -> Self {
        Self {
            base_url,
            api_key: api_key.into(),
            // Image generation is slow.
            timeout_secs: 120,
        }
    }
}

/// LinkedIn REST settings. Credentials live with the publisher record,
/// not here.
#[derive(Debug, Clone)]
pub struct LinkedInConfig {
    pub base_url: Url,
    pub timeout_secs: u64,
}

impl LinkedInConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout_secs: 30,
        }
    }
}

/// Every collaborator's configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub anthropic: Option<AnthropicConfig>,
    pub openai: Option<OpenAiConfig>,
    pub linkedin: LinkedInConfig,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `ANTHROPIC_API_KEY` (optional; enables ordering, tagging and prompts)
    /// - `ANTHROPIC_BASE_URL` (default: `https://api.anthropic.com`)
    /// - `CADENCE_ANTHROPIC_MODEL` (default: [`DEFAULT_ANTHROPIC_MODEL`])
    /// - `OPENAI_API_KEY` (optional; enables image rendering)
    /// - `OPENAI_BASE_URL` (default: `https://api.openai.com`)
    /// - `LINKEDIN_BASE_URL` (default: `https://api.linkedin.com`)
    pub fn from_env() -> Result<Self, ConfigError> {
        let anthropic = match non_empty_var("ANTHROPIC_API_KEY") {
            Some(key) => {
                let mut cfg = AnthropicConfig::new(
                    env_url("ANTHROPIC_BASE_URL", "https://api.anthropic.com")?,
                    key,
                );
                if let Some(model) = non_empty_var("CADENCE_ANTHROPIC_MODEL") {
                    cfg.model = model;
                }
                Some(cfg)
            }
            None => None,
        };
        let openai = match non_empty_var("OPENAI_API_KEY") {
            Some(key) => Some(OpenAiConfig::new(
                env_url("OPENAI_BASE_URL", "https://api.openai.com")?,
                key,
            )),
            None => None,
        };
        Ok(Self {
            anthropic,
            openai,
            linkedin: LinkedInConfig::new(env_url(
                "LINKEDIN_BASE_URL",
                "https://api.linkedin.com",
            )?),
        })
    }

    /// Point every collaborator at one local server (for testing).
    pub fn local_mock(base: &str, key: &str) -> Result<Self, ConfigError> {
        let url = Url::parse(base).map_err(|e| ConfigError::InvalidUrl(base.to_string(), e.to_string()))?;
        Ok(Self {
            anthropic: Some(AnthropicConfig {
                timeout_secs: 5,
                ..AnthropicConfig::new(url.clone(), key)
            }),
            openai: Some(OpenAiConfig {
                timeout_secs: 5,
                ..OpenAiConfig::new(url.clone(), key)
            }),
            linkedin: LinkedInConfig {
                base_url: url,
                timeout_secs: 5,
            },
        })
    }
}

fn non_empty_var(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
}

/// Join a path onto a base URL, keeping any base path prefix.
pub(crate) fn endpoint_url(base: &Url, path: &str) -> String {
    format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
}
