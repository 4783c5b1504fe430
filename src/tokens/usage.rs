//! Usage reporting for completed generations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Token delta for one completed call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub sent: u64,
    pub received: u64,
}

impl TokenUsage {
    pub fn new(sent: u64, received: u64) -> Self {
        Self { sent, received }
    }
}

impl std::ops::AddAssign for TokenUsage {
    fn add_assign(&mut self, rhs: Self) {
        self.sent += rhs.sent;
        self.received += rhs.received;
    }
}

/// Destination for usage deltas; the generator reports once per completed call.
#[async_trait]
pub trait UsageSink: Send + Sync {
    async fn report(&self, usage: TokenUsage);
}

/// No-op sink (default).
pub struct NoopUsageSink;

#[async_trait]
impl UsageSink for NoopUsageSink {
    async fn report(&self, _: TokenUsage) {}
}

pub fn noop_sink() -> Arc<dyn UsageSink> {
    Arc::new(NoopUsageSink)
}

/// Running totals for one chat session.
#[derive(Default)]
pub struct SessionUsage {
    sent: AtomicU64,
    received: AtomicU64,
    calls: AtomicU64,
}

impl SessionUsage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn totals(&self) -> TokenUsage {
        TokenUsage {
            sent: self.sent.load(Ordering::Relaxed),
            received: self.received.load(Ordering::Relaxed),
        }
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.sent.store(0, Ordering::Relaxed);
        self.received.store(0, Ordering::Relaxed);
        self.calls.store(0, Ordering::Relaxed);
    }
}

#[async_trait]
impl UsageSink for SessionUsage {
    async fn report(&self, usage: TokenUsage) {
        self.sent.fetch_add(usage.sent, Ordering::Relaxed);
        self.received.fetch_add(usage.received, Ordering::Relaxed);
        self.calls.fetch_add(1, Ordering::Relaxed);
    }
}
