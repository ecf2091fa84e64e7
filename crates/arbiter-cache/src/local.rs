use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use indexmap::IndexMap;
use mini_moka::sync::Cache;

use crate::CachedAnswer;

#[derive(Clone)]
struct StoredEntry {
    answer: Arc<CachedAnswer>,
    expires_at: Instant,
}

/// In-process tier: one LRU per namespace
///
/// Capacity comes from the per-namespace override when configured,
/// otherwise from the default. Entries carry their own expiry because
/// time-to-live differs per mode, not per namespace.
pub(crate) struct LocalTier {
    caches: DashMap<String, Cache<String, StoredEntry>>,
    default_capacity: u64,
    overrides: HashMap<String, u64>,
}

impl LocalTier {
    pub(crate) fn new(default_capacity: u64, overrides: &IndexMap<String, u64>) -> Self {
        Self {
            caches: DashMap::new(),
            default_capacity,
            overrides: overrides.iter().map(|(k, v)| (k.clone(), *v)).collect(),
        }
    }

    fn cache_for(&self, namespace: &str) -> Cache<String, StoredEntry> {
        if let Some(cache) = self.caches.get(namespace) {
            return cache.clone();
        }

        let capacity = self
            .overrides
            .get(namespace)
            .copied()
            .unwrap_or(self.default_capacity);
        let cache = Cache::builder().max_capacity(capacity).build();
        self.caches.entry(namespace.to_owned()).or_insert(cache).clone()
    }

    pub(crate) fn get(&self, namespace: &str, key: &str) -> Option<Arc<CachedAnswer>> {
        let cache = self.caches.get(namespace)?.clone();
        let entry = cache.get(&key.to_owned())?;

        if Instant::now() >= entry.expires_at {
            cache.invalidate(&key.to_owned());
            return None;
        }

        Some(entry.answer)
    }

    pub(crate) fn insert(
        &self,
        namespace: &str,
        key: String,
        answer: Arc<CachedAnswer>,
        ttl: Duration,
    ) {
        let entry = StoredEntry {
            answer,
            expires_at: Instant::now() + ttl,
        };
        self.cache_for(namespace).insert(key, entry);
    }

    pub(crate) fn entry_count(&self) -> u64 {
        self.caches.iter().map(|cache| cache.entry_count()).sum()
    }
}

#[cfg(test)]
mod tests {
    use arbiter_core::Mode;

    use super::*;

    fn answer(text: &str) -> Arc<CachedAnswer> {
        Arc::new(CachedAnswer {
            answer_text: text.to_owned(),
            passages: Vec::new(),
            confidence: 0.9,
            mode: Mode::Fast,
        })
    }

    #[test]
    fn round_trips_within_ttl() {
        let tier = LocalTier::new(16, &IndexMap::new());
        tier.insert("speculative", "k1".to_owned(), answer("Paris"), Duration::from_secs(60));

        let hit = tier.get("speculative", "k1").unwrap();
        assert_eq!(hit.answer_text, "Paris");
    }

    #[test]
    fn expired_entry_is_dropped() {
        let tier = LocalTier::new(16, &IndexMap::new());
        tier.insert("speculative", "k1".to_owned(), answer("Paris"), Duration::ZERO);

        std::thread::sleep(Duration::from_millis(5));
        assert!(tier.get("speculative", "k1").is_none());
    }

    #[test]
    fn namespaces_are_isolated() {
        let tier = LocalTier::new(16, &IndexMap::new());
        tier.insert("speculative", "k1".to_owned(), answer("Paris"), Duration::from_secs(60));

        assert!(tier.get("deep", "k1").is_none());
        assert!(tier.get("speculative", "k1").is_some());
    }

    #[test]
    fn unknown_namespace_misses_without_creating_a_cache() {
        let tier = LocalTier::new(16, &IndexMap::new());
        assert!(tier.get("never-written", "k1").is_none());
        assert_eq!(tier.entry_count(), 0);
    }
}
