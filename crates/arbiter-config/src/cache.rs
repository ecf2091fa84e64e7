use indexmap::IndexMap;
use serde::Deserialize;
use url::Url;

/// Response cache configuration
///
/// The cache always has an in-process tier; the shared tier is active
/// only when `url` is set. Losing the shared tier degrades the cache to
/// local-only, it never fails requests.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Whether caching is enabled at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Shared-tier (Valkey/Redis) connection URL
    #[serde(default)]
    pub url: Option<Url>,
    /// Key prefix in the shared tier
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Default per-namespace entry capacity for the in-process tier
    #[serde(default = "default_local_capacity")]
    pub local_capacity: u64,
    /// Timeout for shared-tier operations, in milliseconds
    #[serde(default = "default_shared_timeout_ms")]
    pub shared_timeout_ms: u64,
    /// Per-namespace capacity overrides
    #[serde(default)]
    pub namespaces: IndexMap<String, u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            url: None,
            key_prefix: default_key_prefix(),
            local_capacity: default_local_capacity(),
            shared_timeout_ms: default_shared_timeout_ms(),
            namespaces: IndexMap::new(),
        }
    }
}

const fn default_enabled() -> bool {
    true
}

fn default_key_prefix() -> String {
    "arbiter:cache".to_owned()
}

const fn default_local_capacity() -> u64 {
    1_024
}

const fn default_shared_timeout_ms() -> u64 {
    150
}
