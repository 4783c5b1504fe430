//! Cache key generation.

use crate::types::{ConversationWindow, GenerationParams, Message};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Opaque cache key, `<namespace>:<sha256 hex>` when produced by [`CacheKeyGenerator`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CacheKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
impl From<String> for CacheKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Derives deterministic keys from (prompt, trailing context, parameters).
///
/// The digest input is `<scheme>:<prompt>:<context json>:<params json>` where both
/// JSON documents are serialized with sorted object keys, so equal content always
/// hashes identically regardless of field order.
#[derive(Debug, Clone)]
pub struct CacheKeyGenerator {
    window: ConversationWindow,
    namespace: String,
    scheme: String,
}

impl CacheKeyGenerator {
    pub const DEFAULT_NAMESPACE: &'static str = "hf_cache";
    pub const DEFAULT_SCHEME: &'static str = "v1";

    pub fn new(window: ConversationWindow) -> Self {
        Self {
            window,
            namespace: Self::DEFAULT_NAMESPACE.to_string(),
            scheme: Self::DEFAULT_SCHEME.to_string(),
        }
    }

    pub fn window(&self) -> &ConversationWindow {
        &self.window
    }

    /// `history` holds the prior turns only; the live prompt is passed separately.
    pub fn generate(
        &self,
        prompt: &str,
        history: &[Message],
        params: &GenerationParams,
    ) -> CacheKey {
        let context = canonical_context(&self.window.select(history));
        let params = canonical_params(params);
        let input = format!("{}:{}:{}:{}", self.scheme, prompt, context, params);

        let digest = Sha256::digest(input.as_bytes());
        let hash: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
        CacheKey::new(format!("{}:{}", self.namespace, hash))
    }
}

impl Default for CacheKeyGenerator {
    fn default() -> Self {
        Self::new(ConversationWindow::default())
    }
}

fn canonical_context(turns: &[Message]) -> String {
    let entries: Vec<BTreeMap<&str, &str>> = turns
        .iter()
        .map(|m| BTreeMap::from([("content", m.content.as_str()), ("role", m.role.as_str())]))
        .collect();
    serde_json::to_string(&entries).unwrap_or_default()
}

fn canonical_params(params: &GenerationParams) -> String {
    let sorted: BTreeMap<String, Value> = match serde_json::to_value(params) {
        Ok(Value::Object(map)) => map.into_iter().collect(),
        _ => BTreeMap::new(),
    };
    serde_json::to_string(&sorted).unwrap_or_default()
}
