use crate::config::Settings;
use crate::types::GenerationParams;
use crate::{BoxStream, Error, Result};
use bytes::Bytes;
use futures::{stream, StreamExt};
use serde::Serialize;
use std::env;
use std::time::Duration;
use uuid::Uuid;

/// Request body understood by the inference endpoint.
#[derive(Debug, Serialize)]
pub struct InferenceRequest<'a> {
    pub inputs: &'a str,
    pub parameters: &'a GenerationParams,
    pub stream: bool,
}

/// HTTP transport to a single model endpoint.
///
/// `timeout` bounds connecting and waiting for response headers. A streaming
/// body has no overall deadline; it fails only when no bytes arrive for
/// `timeout`. Non-streaming calls get `timeout` as a whole-request deadline.
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    api_token: Option<String>,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>, api_token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .pool_max_idle_per_host(
                env::var("INFERENCE_POOL_MAX_IDLE_PER_HOST")
                    .ok()
                    .and_then(|s| s.parse::<usize>().ok())
                    .unwrap_or(8),
            )
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self {
            client,
            url: url.into(),
            api_token,
            timeout,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(
            settings.endpoint_url(),
            settings.api_token.clone(),
            settings.request_timeout,
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn send(&self, body: &InferenceRequest<'_>) -> Result<reqwest::Response> {
        let request_id = Uuid::new_v4().to_string();
        let mut req = self
            .client
            .post(&self.url)
            .json(body)
            .header("x-request-id", &request_id);

        if let Some(token) = &self.api_token {
            req = req.bearer_auth(token);
        }
        if body.stream {
            req = req.header("accept", "text/event-stream");
        } else {
            req = req.timeout(self.timeout);
        }

        tracing::debug!(url = %self.url, request_id = %request_id, stream = body.stream, "sending inference request");
        let resp = match tokio::time::timeout(self.timeout, req.send()).await {
            Ok(resp) => resp?,
            Err(_) => {
                return Err(Error::Transport(TransportError::Timeout(format!(
                    "no response headers within {}ms",
                    self.timeout.as_millis()
                ))))
            }
        };

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(Error::Remote {
                status: status.as_u16(),
                message: truncate(&text, 200),
            });
        }
        Ok(resp)
    }

    /// POST with streaming enabled and hand back the raw body as a byte stream.
    ///
    /// The body may take as long as the endpoint keeps producing; a gap longer
    /// than the transport timeout between two reads ends the stream with a
    /// [`TransportError::Timeout`]. Dropping the returned stream releases the
    /// connection.
    pub async fn execute_stream(
        &self,
        body: &InferenceRequest<'_>,
    ) -> Result<BoxStream<'static, Bytes>> {
        let resp = self.send(body).await?;
        Ok(idle_guarded(resp.bytes_stream(), self.timeout))
    }

    /// POST and decode the whole response as one JSON document.
    pub async fn execute(&self, body: &InferenceRequest<'_>) -> Result<serde_json::Value> {
        let resp = self.send(body).await?;
        let json = resp.json().await?;
        Ok(json)
    }
}

/// Fail a byte stream whose next read takes longer than `idle`.
fn idle_guarded<S>(body: S, idle: Duration) -> BoxStream<'static, Bytes>
where
    S: futures::Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
{
    let body = Box::pin(body);
    let guarded = stream::unfold(Some(body), move |state| async move {
        let mut body = state?;
        match tokio::time::timeout(idle, body.next()).await {
            Ok(Some(Ok(bytes))) => Some((Ok(bytes), Some(body))),
            Ok(Some(Err(e))) => Some((Err(Error::Transport(TransportError::Http(e))), None)),
            Ok(None) => None,
            Err(_) => Some((
                Err(Error::Transport(TransportError::Timeout(format!(
                    "no data received for {}ms",
                    idle.as_millis()
                )))),
                None,
            )),
        }
    });
    Box::pin(guarded)
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Transport error: {0}")]
    Other(String),
}
