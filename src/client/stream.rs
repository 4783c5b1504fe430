use crate::tokens::TokenUsage;
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::{mpsc, oneshot};

/// Text fragments of one generation, in arrival order.
///
/// Finite and not restartable. Dropping it cancels the producing task; a
/// cancelled generation is never cached.
pub struct GenerationStream {
    fragments: mpsc::Receiver<String>,
    usage_rx: Option<oneshot::Receiver<TokenUsage>>,
    usage: Option<TokenUsage>,
}

impl GenerationStream {
    pub(crate) fn new(
        fragments: mpsc::Receiver<String>,
        usage_rx: oneshot::Receiver<TokenUsage>,
    ) -> Self {
        Self {
            fragments,
            usage_rx: Some(usage_rx),
            usage: None,
        }
    }

    /// Token usage of this call, available once the stream has ended.
    ///
    /// `None` while fragments are still pending, and for failed or empty
    /// generations.
    pub fn usage(&mut self) -> Option<TokenUsage> {
        if let Some(rx) = self.usage_rx.as_mut() {
            match rx.try_recv() {
                Ok(usage) => {
                    self.usage = Some(usage);
                    self.usage_rx = None;
                }
                Err(oneshot::error::TryRecvError::Closed) => self.usage_rx = None,
                Err(oneshot::error::TryRecvError::Empty) => {}
            }
        }
        self.usage
    }
}

impl Stream for GenerationStream {
    type Item = String;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<String>> {
        self.fragments.poll_recv(cx)
    }
}

impl std::fmt::Debug for GenerationStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationStream")
            .field("usage", &self.usage)
            .finish_non_exhaustive()
    }
}
