use crate::cache::{CacheKey, CacheKeyGenerator, CacheProvider, CacheStats};
use crate::client::stream::GenerationStream;
use crate::pipeline::{decode_chunks, generated_text, replay_chars, StreamAccumulator};
use crate::prompt::PromptFormatter;
use crate::tokens::{TokenCounter, TokenUsage, UsageSink, WordCounter};
use crate::transport::{HttpTransport, InferenceRequest};
use crate::types::{GenerationParams, Message};
use crate::Result;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// Fragments buffered between the producing task and the caller.
const FRAGMENT_BUFFER: usize = 64;

/// Cached, streaming client for one model endpoint.
///
/// Cheap to clone; clones share the transport, the cache and the usage sink.
#[derive(Clone)]
pub struct InferenceClient {
    pub(crate) transport: Arc<HttpTransport>,
    pub(crate) cache: Arc<CacheProvider>,
    pub(crate) usage: Arc<dyn UsageSink>,
    pub(crate) keys: CacheKeyGenerator,
    pub(crate) formatter: PromptFormatter,
    pub(crate) replay_delay: Duration,
    pub(crate) model: String,
}

/// Everything one generation task needs, detached from the client borrow.
struct Job {
    transport: Arc<HttpTransport>,
    cache: Arc<CacheProvider>,
    usage: Arc<dyn UsageSink>,
    key: CacheKey,
    prompt: String,
    params: GenerationParams,
    replay_delay: Duration,
}

enum Outcome {
    Completed(TokenUsage),
    Empty,
    Failed,
    Cancelled,
}

impl InferenceClient {
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn cache(&self) -> &Arc<CacheProvider> {
        &self.cache
    }

    pub fn backend_name(&self) -> &'static str {
        self.cache.backend_name()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Flush every entry of the active cache backend.
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
        tracing::info!(backend = self.backend_name(), "cache cleared");
    }

    /// Stream the response to `prompt`, given the prior turns in `history`.
    ///
    /// `history` must not contain the live prompt. Cached responses are replayed
    /// one character at a time; fresh ones are forwarded chunk by chunk and
    /// cached once the endpoint finishes. Failures arrive as a single
    /// `"Error: ..."` fragment. Must be called within a tokio runtime.
    pub fn generate_stream(
        &self,
        prompt: &str,
        history: &[Message],
        params: &GenerationParams,
    ) -> GenerationStream {
        let (tx, rx) = mpsc::channel(FRAGMENT_BUFFER);
        let (usage_tx, usage_rx) = oneshot::channel();

        if let Err(e) = params.validate() {
            tracing::warn!(error = %e, "rejecting generation parameters");
            // Capacity is at least one, so this cannot fail.
            let _ = tx.try_send(format!("Error: {e}"));
            return GenerationStream::new(rx, usage_rx);
        }

        let job = Job {
            transport: self.transport.clone(),
            cache: self.cache.clone(),
            usage: self.usage.clone(),
            key: self.keys.generate(prompt, history, params),
            prompt: self.formatter.format(prompt, history),
            params: params.clone(),
            replay_delay: self.replay_delay,
        };

        tokio::spawn(async move {
            match job.run(&tx).await {
                Outcome::Completed(usage) => {
                    job.usage.report(usage).await;
                    let _ = usage_tx.send(usage);
                }
                Outcome::Empty => tracing::debug!(key = %job.key, "generation produced no text"),
                Outcome::Failed => {}
                Outcome::Cancelled => {
                    tracing::debug!(key = %job.key, "generation cancelled by caller")
                }
            }
        });

        GenerationStream::new(rx, usage_rx)
    }

    /// Blocking counterpart of [`generate_stream`](Self::generate_stream).
    ///
    /// Shares cache entries with the streaming path. Returns `Ok(None)` when the
    /// endpoint answered without any text.
    pub async fn generate(
        &self,
        prompt: &str,
        history: &[Message],
        params: &GenerationParams,
    ) -> Result<Option<String>> {
        params.validate()?;
        let key = self.keys.generate(prompt, history, params);
        let formatted = self.formatter.format(prompt, history);
        let sent = WordCounter.count(&formatted) as u64;

        if let Some(text) = self.cache.get(&key).await {
            tracing::debug!(key = %key, "cache hit");
            let received = WordCounter.count(&text) as u64;
            self.usage.report(TokenUsage::new(sent, received)).await;
            return Ok(Some(text));
        }
        tracing::debug!(key = %key, "cache miss");

        let body = InferenceRequest {
            inputs: &formatted,
            parameters: params,
            stream: false,
        };
        let value = self.transport.execute(&body).await.map_err(|e| {
            tracing::error!(error = %e, "inference request failed");
            e
        })?;

        let Some(text) = generated_text(value).filter(|t| !t.is_empty()) else {
            tracing::debug!(key = %key, "response carried no generated text");
            return Ok(None);
        };

        self.cache.set(&key, &text).await;
        let received = WordCounter.count(&text) as u64;
        self.usage.report(TokenUsage::new(sent, received)).await;
        Ok(Some(text))
    }
}

impl Job {
    async fn run(&self, tx: &mpsc::Sender<String>) -> Outcome {
        let sent = WordCounter.count(&self.prompt) as u64;

        if let Some(text) = self.cache.get(&self.key).await {
            tracing::debug!(key = %self.key, "cache hit, replaying");
            let received = WordCounter.count(&text) as u64;
            let replay = replay_chars(text, self.replay_delay);
            futures::pin_mut!(replay);
            loop {
                let fragment = tokio::select! {
                    biased;
                    _ = tx.closed() => return Outcome::Cancelled,
                    next = replay.next() => next,
                };
                let Some(fragment) = fragment else { break };
                if tx.send(fragment).await.is_err() {
                    return Outcome::Cancelled;
                }
            }
            return Outcome::Completed(TokenUsage::new(sent, received));
        }
        tracing::debug!(key = %self.key, "cache miss");

        let body = InferenceRequest {
            inputs: &self.prompt,
            parameters: &self.params,
            stream: true,
        };
        let response = tokio::select! {
            biased;
            _ = tx.closed() => return Outcome::Cancelled,
            r = self.transport.execute_stream(&body) => r,
        };
        let bytes = match response {
            Ok(bytes) => bytes,
            Err(e) => return fail(tx, e).await,
        };

        let mut chunks = decode_chunks(bytes);
        let mut acc = StreamAccumulator::new();
        loop {
            let next = tokio::select! {
                biased;
                _ = tx.closed() => return Outcome::Cancelled,
                next = chunks.next() => next,
            };
            match next {
                Some(Ok(chunk)) => {
                    let fragment = acc.push(chunk);
                    if fragment.is_empty() {
                        continue;
                    }
                    if tx.send(fragment).await.is_err() {
                        return Outcome::Cancelled;
                    }
                }
                Some(Err(e)) => return fail(tx, e).await,
                None => break,
            }
        }

        match acc.finish() {
            Some((text, received)) => {
                self.cache.set(&self.key, &text).await;
                Outcome::Completed(TokenUsage::new(sent, received))
            }
            None => Outcome::Empty,
        }
    }
}

async fn fail(tx: &mpsc::Sender<String>, e: crate::Error) -> Outcome {
    tracing::error!(error = %e, "inference stream failed");
    let _ = tx.send(format!("Error: {e}")).await;
    Outcome::Failed
}
