use crate::cache::{CacheKeyGenerator, CacheProvider};
use crate::client::core::InferenceClient;
use crate::config::Settings;
use crate::prompt::PromptFormatter;
use crate::tokens::{noop_sink, UsageSink};
use crate::transport::HttpTransport;
use crate::Result;
use std::sync::Arc;
use std::time::Duration;

/// Builder for creating clients with custom configuration.
///
/// Everything defaults to what [`Settings`] says; the overrides exist mainly so
/// tests can point the client at a mock server and a private cache.
pub struct InferenceClientBuilder {
    settings: Settings,
    usage: Arc<dyn UsageSink>,
    cache: Option<Arc<CacheProvider>>,
    /// Override base URL (primarily for testing with mock servers)
    base_url_override: Option<String>,
    replay_delay: Option<Duration>,
}

impl InferenceClientBuilder {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            usage: noop_sink(),
            cache: None,
            base_url_override: None,
            replay_delay: None,
        }
    }

    /// Override the endpoint base URL; the model name is still appended.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url_override = Some(url.into());
        self
    }

    /// Use an already constructed cache instead of probing Redis at build time.
    pub fn cache_provider(mut self, cache: Arc<CacheProvider>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Inject a usage sink. Default is a no-op sink.
    pub fn usage_sink(mut self, sink: Arc<dyn UsageSink>) -> Self {
        self.usage = sink;
        self
    }

    /// Pause between replayed characters on a cache hit.
    pub fn replay_delay(mut self, delay: Duration) -> Self {
        self.replay_delay = Some(delay);
        self
    }

    /// Validate settings, build the transport and select the cache backend.
    pub async fn build(self) -> Result<InferenceClient> {
        let mut settings = self.settings;
        if let Some(url) = self.base_url_override {
            settings.base_url = url;
        }
        settings.validate()?;

        let transport = HttpTransport::from_settings(&settings)?;
        let cache = match self.cache {
            Some(cache) => cache,
            None => Arc::new(CacheProvider::connect(&settings.cache).await),
        };

        tracing::info!(
            model = %settings.model,
            endpoint = transport.url(),
            cache = cache.backend_name(),
            "inference client ready"
        );

        Ok(InferenceClient {
            transport: Arc::new(transport),
            cache,
            usage: self.usage,
            keys: CacheKeyGenerator::new(settings.window),
            formatter: PromptFormatter::new(settings.window),
            replay_delay: self.replay_delay.unwrap_or(settings.replay_delay),
            model: settings.model,
        })
    }
}
