//! Client and server configuration.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::retry::RetryPolicy;

pub const DEFAULT_ENDPOINT_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent";

pub const DEFAULT_PROMPT: &str = "Write concise alt text for this image. Describe the important \
    visual content in one or two sentences, suitable for a screen reader. Do not start with \
    \"Image of\" or \"Picture of\".";

/// Everything the inference client needs, passed in at construction.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint_url: String,
    pub endpoint_key: String,
    pub prompt: String,
    pub retry: RetryPolicy,
    /// Per-call timeout. A timed-out call counts as a transport failure.
    pub request_timeout: Option<Duration>,
}

impl ClientConfig {
    /// Defaults for everything except the key.
    pub fn new(endpoint_key: impl Into<String>) -> Self {
        Self {
            endpoint_url: DEFAULT_ENDPOINT_URL.to_string(),
            endpoint_key: endpoint_key.into(),
            prompt: DEFAULT_PROMPT.to_string(),
            retry: RetryPolicy::default(),
            request_timeout: Some(Duration::from_secs(60)),
        }
    }

    pub fn with_endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.endpoint_url = url.into();
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Configuration for the web app binary.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub client: ClientConfig,
    pub bind_addr: SocketAddr,
    /// Shown next to each description.
    pub model_label: String,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup("GEMINI_API_KEY").context("GEMINI_API_KEY must be set")?;

        let mut client = ClientConfig::new(api_key);
        if let Some(url) = lookup("GEMINI_ENDPOINT_URL") {
            client.endpoint_url = url;
        }
        if let Some(prompt) = lookup("ALT_TEXT_PROMPT") {
            client.prompt = prompt;
        }
        if let Some(n) = parse_var(&lookup, "ALT_TEXT_MAX_ATTEMPTS")? {
            client.retry.max_attempts = n;
        }
        if let Some(ms) = parse_var(&lookup, "ALT_TEXT_BASE_DELAY_MS")? {
            client.retry.base_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "ALT_TEXT_MAX_DELAY_MS")? {
            // 0 disables the cap
            client.retry.max_delay = (ms > 0).then(|| Duration::from_millis(ms));
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "ALT_TEXT_REQUEST_TIMEOUT_SECS")? {
            client.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        Ok(Self {
            client,
            bind_addr: parse_var(&lookup, "ALT_TEXT_BIND")?
                .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000))),
            model_label: lookup("GEMINI_MODEL_LABEL")
                .unwrap_or_else(|| "Google Gemini 2.5 Flash".to_string()),
            max_upload_bytes: parse_var(&lookup, "ALT_TEXT_MAX_UPLOAD_BYTES")?
                .unwrap_or(20 * 1024 * 1024),
        })
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("invalid value for {key}: {raw:?}"))
        })
        .transpose()
}
