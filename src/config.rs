//! Process configuration read from the environment.
//!
//! Every knob has a default so a bare `Settings::from_env()` always succeeds;
//! unparsable values fall back to the default with a warning rather than aborting.

use crate::types::ConversationWindow;
use crate::{Error, ErrorContext, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "Qwen/Qwen2.5-Coder-32B-Instruct";
pub const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co/models";
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379/0";
pub const DEFAULT_MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

/// Cache-related settings consumed by [`crate::cache::CacheProvider::connect`].
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSettings {
    pub ttl: Duration,
    pub max_entries: usize,
    /// `None` disables the Redis probe entirely.
    pub redis_url: Option<String>,
    pub redis_connect_timeout: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(3600),
            max_entries: 1000,
            redis_url: Some(DEFAULT_REDIS_URL.to_string()),
            redis_connect_timeout: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_token: Option<String>,
    pub model: String,
    pub base_url: String,
    pub request_timeout: Duration,
    pub cache: CacheSettings,
    pub window: ConversationWindow,
    pub replay_delay: Duration,
    pub max_file_size: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_token: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            cache: CacheSettings::default(),
            window: ConversationWindow::default(),
            replay_delay: Duration::from_millis(10),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_token = env::var("HUGGING_FACE_API_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());

        let redis_url = match env::var("REDIS_URL") {
            Ok(url) if url.trim().is_empty() => None,
            Ok(url) => Some(url),
            Err(_) => defaults.cache.redis_url.clone(),
        };

        let timeout_secs = env_parse::<u64>("INFERENCE_TIMEOUT_SECS")
            .or_else(|| env_parse::<u64>("DEFAULT_TIMEOUT"))
            .unwrap_or(defaults.request_timeout.as_secs());

        Self {
            api_token,
            model: env::var("DEFAULT_MODEL").unwrap_or(defaults.model),
            base_url: env::var("INFERENCE_BASE_URL").unwrap_or(defaults.base_url),
            request_timeout: Duration::from_secs(timeout_secs),
            cache: CacheSettings {
                ttl: env_parse::<u64>("CACHE_TTL")
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.cache.ttl),
                max_entries: env_parse("MAX_CACHE_SIZE").unwrap_or(defaults.cache.max_entries),
                redis_url,
                redis_connect_timeout: env_parse::<u64>("REDIS_CONNECT_TIMEOUT_MS")
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.cache.redis_connect_timeout),
            },
            window: ConversationWindow::new(
                env_parse("MAX_CONTEXT_LENGTH").unwrap_or(defaults.window.max_messages),
                env_parse("CONTEXT_CHAR_BUDGET").unwrap_or(defaults.window.char_budget),
            ),
            replay_delay: env_parse::<u64>("REPLAY_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.replay_delay),
            max_file_size: env_parse("MAX_FILE_SIZE").unwrap_or(defaults.max_file_size),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.cache.max_entries == 0 {
            return Err(invalid("MAX_CACHE_SIZE", "cache capacity must be at least 1"));
        }
        if self.cache.ttl.is_zero() {
            return Err(invalid("CACHE_TTL", "cache TTL must be at least one second"));
        }
        if self.window.max_messages == 0 {
            return Err(invalid(
                "MAX_CONTEXT_LENGTH",
                "context length must include the live prompt",
            ));
        }
        if self.model.trim().is_empty() {
            return Err(invalid("DEFAULT_MODEL", "model name is empty"));
        }
        url::Url::parse(&self.base_url).map_err(|e| {
            Error::configuration_with_context(
                "invalid inference base URL",
                ErrorContext::new()
                    .with_field_path("INFERENCE_BASE_URL")
                    .with_details(e.to_string()),
            )
        })?;
        Ok(())
    }

    /// Full endpoint URL for the configured model.
    pub fn endpoint_url(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), self.model)
    }
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(var = name, value = %raw, "ignoring unparsable setting");
            None
        }
    }
}

fn invalid(field: &str, msg: &str) -> Error {
    Error::configuration_with_context(
        msg,
        ErrorContext::new()
            .with_field_path(field)
            .with_source("settings"),
    )
}
