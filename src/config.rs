//! Configuration for the advisor pipeline.
//!
//! All behaviour is controlled through [`AdvisorConfig`], built via its
//! [`AdvisorConfigBuilder`] or loaded with [`AdvisorConfig::from_env`].
//! Configuration is always passed in explicitly: nothing inside the pipeline
//! reads the environment, so tests can substitute a stub transport without
//! touching process state.

use crate::error::AdviseError;
use crate::pipeline::transport::Transport;
use std::fmt;
use std::sync::Arc;

/// Default OpenAI-compatible endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.poe.com/v1";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "Claude-Sonnet-4";

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "POE_API_KEY";

/// Configuration for an [`crate::advise::Advisor`].
///
/// # Example
/// ```rust
/// use adviseme::AdvisorConfig;
///
/// let config = AdvisorConfig::builder()
///     .api_key("sk-test")
///     .model("Claude-Sonnet-4")
///     .request_timeout_secs(120)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_retries, 0);
/// ```
#[derive(Clone)]
pub struct AdvisorConfig {
    /// Bearer token for the chat-completion endpoint. Never logged.
    pub api_key: Option<String>,

    /// Base URL; `/chat/completions` is appended. Default: [`DEFAULT_BASE_URL`].
    pub base_url: String,

    /// Model identifier sent with every request. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Custom advisor prompt. If None, uses [`crate::prompts::DEFAULT_ADVISOR_PROMPT`].
    pub prompt: Option<String>,

    /// Whole-request timeout in seconds. Default: 300.
    pub request_timeout_secs: u64,

    /// Connect timeout in seconds. Default: 10.
    pub connect_timeout_secs: u64,

    /// Extra attempts after a connection-level failure. Default: 0.
    ///
    /// Zero keeps one attempt per user action. Remote errors (4xx/5xx) and
    /// malformed replies are never retried.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (exponential backoff). Default: 500.
    pub retry_backoff_ms: u64,

    /// Pre-constructed transport. Takes precedence over `api_key`/`base_url`.
    pub transport: Option<Arc<dyn Transport>>,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            prompt: None,
            request_timeout_secs: 300,
            connect_timeout_secs: 10,
            max_retries: 0,
            retry_backoff_ms: 500,
            transport: None,
        }
    }
}

impl fmt::Debug for AdvisorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdvisorConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("prompt", &self.prompt.as_ref().map(|p| p.len()))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("transport", &self.transport.as_ref().map(|_| "<dyn Transport>"))
            .finish()
    }
}

impl AdvisorConfig {
    /// Create a new builder for `AdvisorConfig`.
    pub fn builder() -> AdvisorConfigBuilder {
        AdvisorConfigBuilder {
            config: Self::default(),
        }
    }

    /// Load configuration from the process environment.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `POE_API_KEY` | `api_key` |
    /// | `ADVISEME_BASE_URL` | `base_url` |
    /// | `ADVISEME_MODEL` | `model` |
    /// | `ADVISEME_TIMEOUT_SECS` | `request_timeout_secs` |
    /// | `ADVISEME_MAX_RETRIES` | `max_retries` |
    ///
    /// Unset or empty variables keep their defaults.
    pub fn from_env() -> Result<Self, AdviseError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AdviseError> {
        let get = |k: &str| lookup(k).filter(|v| !v.trim().is_empty());
        let mut builder = Self::builder();

        if let Some(key) = get(API_KEY_ENV) {
            builder = builder.api_key(key);
        }
        if let Some(url) = get("ADVISEME_BASE_URL") {
            builder = builder.base_url(url);
        }
        if let Some(model) = get("ADVISEME_MODEL") {
            builder = builder.model(model);
        }
        if let Some(secs) = get("ADVISEME_TIMEOUT_SECS") {
            let secs = secs.trim().parse::<u64>().map_err(|e| {
                AdviseError::InvalidConfig(format!("ADVISEME_TIMEOUT_SECS '{secs}': {e}"))
            })?;
            builder = builder.request_timeout_secs(secs);
        }
        if let Some(n) = get("ADVISEME_MAX_RETRIES") {
            let n = n.trim().parse::<u32>().map_err(|e| {
                AdviseError::InvalidConfig(format!("ADVISEME_MAX_RETRIES '{n}': {e}"))
            })?;
            builder = builder.max_retries(n);
        }

        builder.build()
    }

    /// The prompt to send: the override if set, else the built-in one.
    pub fn prompt_text(&self) -> &str {
        self.prompt
            .as_deref()
            .unwrap_or(crate::prompts::DEFAULT_ADVISOR_PROMPT)
    }

    /// Full URL of the chat-completion endpoint.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Builder for [`AdvisorConfig`].
#[derive(Debug)]
pub struct AdvisorConfigBuilder {
    config: AdvisorConfig,
}

impl AdvisorConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.prompt = Some(prompt.into());
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs.max(1);
        self
    }

    pub fn connect_timeout_secs(mut self, secs: u64) -> Self {
        self.config.connect_timeout_secs = secs.max(1);
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n.min(10);
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.config.transport = Some(transport);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AdvisorConfig, AdviseError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(AdviseError::InvalidConfig("model must not be empty".into()));
        }
        if !(c.base_url.starts_with("http://") || c.base_url.starts_with("https://")) {
            return Err(AdviseError::InvalidConfig(format!(
                "base URL must be http(s), got '{}'",
                c.base_url
            )));
        }
        if c.prompt.as_deref().is_some_and(|p| p.trim().is_empty()) {
            return Err(AdviseError::InvalidConfig("prompt must not be empty".into()));
        }
        Ok(self.config)
    }
}
