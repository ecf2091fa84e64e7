//! Two-tier response cache for routed answers
//!
//! Answers are keyed by a SHA-256 hash of the normalized query and its
//! retrieval filter, namespaced per pipeline stage and mode. The
//! in-process tier is always active; a shared Valkey tier joins when a
//! URL is configured. Shared-tier failures degrade lookups to
//! local-only and are never surfaced to the request path.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod key;
mod local;

pub use key::CacheKey;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use arbiter_config::CacheConfig;
use arbiter_core::{Mode, Query, RetrievedPassage, RetryPolicy};
use local::LocalTier;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Connection retry for the shared tier; each attempt is separately
/// bounded by the configured operation timeout
const CONNECT_RETRY: RetryPolicy = RetryPolicy {
    max_attempts: 2,
    base_delay: Duration::from_millis(25),
};

/// Cache errors
#[derive(Debug, Error)]
pub enum CacheError {
    /// Valkey connection or command error
    #[error("cache backend: {0}")]
    Backend(String),
    /// Serialization error
    #[error("serialization: {0}")]
    Serialization(String),
}

/// Cached answer entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedAnswer {
    /// Answer text as produced by the pipeline
    pub answer_text: String,
    /// Passages backing the answer, in relevance order
    pub passages: Vec<RetrievedPassage>,
    /// Confidence the answer scored when it was produced
    pub confidence: f64,
    /// Mode the answer was produced under
    pub mode: Mode,
}

/// Shared-tier wire format
///
/// Carries the original time-to-live so a shared hit can repopulate the
/// local tier; the shared tier itself expires through Valkey.
#[derive(Serialize)]
struct EnvelopeRef<'a> {
    ttl_s: u64,
    answer: &'a CachedAnswer,
}

#[derive(Deserialize)]
struct Envelope {
    ttl_s: u64,
    answer: CachedAnswer,
}

struct SharedTier {
    client: redis::Client,
    op_timeout: Duration,
}

impl SharedTier {
    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, CacheError> {
        CONNECT_RETRY
            .run(|| {
                let client = &self.client;
                let op_timeout = self.op_timeout;
                async move {
                    tokio::time::timeout(op_timeout, client.get_multiplexed_async_connection())
                        .await
                        .map_err(|_| CacheError::Backend("connection timed out".to_owned()))?
                        .map_err(|e| CacheError::Backend(format!("connection failed: {e}")))
                }
            })
            .await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        use redis::AsyncCommands;

        let mut conn = self.connection().await?;
        let value: Option<String> = tokio::time::timeout(self.op_timeout, conn.get(key))
            .await
            .map_err(|_| CacheError::Backend("GET timed out".to_owned()))?
            .map_err(|e| CacheError::Backend(format!("GET failed: {e}")))?;
        Ok(value)
    }

    async fn put(&self, key: &str, data: &str, ttl_secs: u64) -> Result<(), CacheError> {
        use redis::AsyncCommands;

        let mut conn = self.connection().await?;
        let result: Result<(), _> = tokio::time::timeout(self.op_timeout, conn.set_ex(key, data, ttl_secs))
            .await
            .map_err(|_| CacheError::Backend("SET timed out".to_owned()))?;
        result.map_err(|e| CacheError::Backend(format!("SET failed: {e}")))
    }
}

/// Counter snapshot for the operator status surface
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CacheStats {
    pub local_hits: u64,
    pub shared_hits: u64,
    pub misses: u64,
    /// Entries currently held across all local namespaces
    pub local_entries: u64,
    /// Whether a shared tier is configured
    pub shared_active: bool,
}

/// Two-tier response cache
pub struct ResponseCache {
    enabled: bool,
    key_prefix: String,
    local: LocalTier,
    shared: Option<SharedTier>,
    local_hits: AtomicU64,
    shared_hits: AtomicU64,
    misses: AtomicU64,
}

impl ResponseCache {
    /// Create a cache from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the shared-tier URL is set but invalid
    pub fn new(config: &CacheConfig) -> Result<Self, CacheError> {
        let shared = match &config.url {
            Some(url) if config.enabled => {
                let client = redis::Client::open(url.as_str())
                    .map_err(|e| CacheError::Backend(format!("invalid URL: {e}")))?;
                Some(SharedTier {
                    client,
                    op_timeout: Duration::from_millis(config.shared_timeout_ms),
                })
            }
            _ => None,
        };

        Ok(Self {
            enabled: config.enabled,
            key_prefix: config.key_prefix.clone(),
            local: LocalTier::new(config.local_capacity, &config.namespaces),
            shared,
            local_hits: AtomicU64::new(0),
            shared_hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }

    /// Build the cache key for a query in a namespace at a mode
    pub fn key(&self, namespace: &str, mode: Mode, query: &Query) -> CacheKey {
        key::build(&self.key_prefix, namespace, mode, query)
    }

    /// Look up a cached answer, checking local then shared
    ///
    /// A shared hit repopulates the local tier. Shared-tier failures are
    /// logged and treated as misses.
    pub async fn get(&self, key: &CacheKey) -> Option<Arc<CachedAnswer>> {
        if !self.enabled {
            return None;
        }

        if let Some(answer) = self.local.get(key.namespace(), key.as_str()) {
            self.local_hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(key = key.as_str(), "local cache hit");
            return Some(answer);
        }

        if let Some(shared) = &self.shared {
            match shared.get(key.as_str()).await {
                Ok(Some(data)) => match serde_json::from_str::<Envelope>(&data) {
                    Ok(envelope) => {
                        let answer = Arc::new(envelope.answer);
                        self.local.insert(
                            key.namespace(),
                            key.as_str().to_owned(),
                            Arc::clone(&answer),
                            Duration::from_secs(envelope.ttl_s),
                        );
                        self.shared_hits.fetch_add(1, Ordering::Relaxed);
                        tracing::debug!(key = key.as_str(), "shared cache hit");
                        return Some(answer);
                    }
                    Err(error) => {
                        tracing::warn!(key = key.as_str(), %error, "discarding undecodable shared entry");
                    }
                },
                Ok(None) => {}
                Err(error) => {
                    tracing::warn!(key = key.as_str(), %error, "shared cache lookup failed, degrading to local-only");
                }
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(key = key.as_str(), "cache miss");
        None
    }

    /// Store an answer in both tiers
    ///
    /// Shared-tier write failures are logged and otherwise ignored.
    pub async fn insert(&self, key: &CacheKey, answer: CachedAnswer, ttl: Duration) {
        if !self.enabled {
            return;
        }

        let answer = Arc::new(answer);
        self.local
            .insert(key.namespace(), key.as_str().to_owned(), Arc::clone(&answer), ttl);

        if let Some(shared) = &self.shared {
            let envelope = EnvelopeRef {
                ttl_s: ttl.as_secs(),
                answer: &answer,
            };
            match serde_json::to_string(&envelope) {
                Ok(data) => {
                    if let Err(error) = shared.put(key.as_str(), &data, ttl.as_secs()).await {
                        tracing::warn!(key = key.as_str(), %error, "shared cache write failed");
                    }
                }
                Err(error) => {
                    tracing::warn!(key = key.as_str(), %error, "failed to encode cache entry");
                }
            }
        }
    }

    /// Snapshot hit and miss counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            local_hits: self.local_hits.load(Ordering::Relaxed),
            shared_hits: self.shared_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            local_entries: self.local.entry_count(),
            shared_active: self.shared.is_some(),
        }
    }
}
