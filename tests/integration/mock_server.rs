//! Mock HTTP server setup for integration tests

use hf_inference_chat::cache::CacheProvider;
use hf_inference_chat::tokens::SessionUsage;
use hf_inference_chat::{InferenceClient, InferenceClientBuilder, Settings};
use mockito::{Matcher, Mock, Server, ServerGuard};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

pub const MODEL: &str = "test-org/test-model";
pub const MODEL_PATH: &str = "/test-org/test-model";

/// Test fixture that owns a mock server and a client wired to it.
pub struct MockServerFixture {
    pub server: ServerGuard,
    pub client: InferenceClient,
    pub cache: Arc<CacheProvider>,
    pub usage: Arc<SessionUsage>,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        Self::with_token(None).await
    }

    pub async fn with_token(token: Option<&str>) -> Self {
        let mut settings = Settings::default();
        settings.api_token = token.map(str::to_string);
        Self::with_settings(settings).await
    }

    /// Fixture with a custom request timeout.
    pub async fn with_timeout(timeout: Duration) -> Self {
        let mut settings = Settings::default();
        settings.request_timeout = timeout;
        Self::with_settings(settings).await
    }

    async fn with_settings(mut settings: Settings) -> Self {
        let server = Server::new_async().await;
        settings.model = MODEL.to_string();
        settings.cache.redis_url = None;

        let cache = Arc::new(CacheProvider::memory(64, Duration::from_secs(60)));
        let usage = Arc::new(SessionUsage::new());
        let client = InferenceClientBuilder::new(settings)
            .base_url(server.url())
            .cache_provider(cache.clone())
            .usage_sink(usage.clone())
            .replay_delay(Duration::ZERO)
            .build()
            .await
            .expect("failed to build client");

        Self {
            server,
            client,
            cache,
            usage,
        }
    }

    /// Streaming response whose body is `lines` joined by newlines.
    pub async fn mock_stream(&mut self, lines: &[&str], hits: usize) -> Mock {
        self.server
            .mock("POST", MODEL_PATH)
            .match_body(Matcher::PartialJson(serde_json::json!({"stream": true})))
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(lines.join("\n"))
            .expect(hits)
            .create_async()
            .await
    }

    /// Streaming response written line by line with `gap` between lines.
    pub async fn mock_paced_stream(&mut self, lines: Vec<String>, gap: Duration) -> Mock {
        self.server
            .mock("POST", MODEL_PATH)
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_chunked_body(move |w| {
                for line in &lines {
                    writeln!(w, "{line}")?;
                    w.flush()?;
                    std::thread::sleep(gap);
                }
                Ok(())
            })
            .create_async()
            .await
    }

    /// Non-streaming JSON response.
    pub async fn mock_json(&mut self, status: usize, body: &str, hits: usize) -> Mock {
        self.server
            .mock("POST", MODEL_PATH)
            .match_body(Matcher::PartialJson(serde_json::json!({"stream": false})))
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .expect(hits)
            .create_async()
            .await
    }

    /// Error response regardless of the request mode.
    pub async fn mock_error(&mut self, status: usize, body: &str, hits: usize) -> Mock {
        self.server
            .mock("POST", MODEL_PATH)
            .with_status(status)
            .with_body(body)
            .expect(hits)
            .create_async()
            .await
    }
}

/// SSE-framed `generated_text` chunk.
pub fn text_chunk(text: &str) -> String {
    format!("data: {}", serde_json::json!({ "generated_text": text }))
}

/// SSE-framed token chunk.
pub fn token_chunk(id: u32, text: &str) -> String {
    format!(
        "data: {}",
        serde_json::json!({ "token": { "id": id, "text": text, "special": false } })
    )
}
