use serde::Deserialize;

/// Per-mode resource profiles
///
/// Loader validation enforces strictly increasing timeouts and
/// non-decreasing top_k from fast to deep.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModeProfilesConfig {
    #[serde(default = "ModeProfileConfig::fast")]
    pub fast: ModeProfileConfig,
    #[serde(default = "ModeProfileConfig::balanced")]
    pub balanced: ModeProfileConfig,
    #[serde(default = "ModeProfileConfig::deep")]
    pub deep: ModeProfileConfig,
}

impl Default for ModeProfilesConfig {
    fn default() -> Self {
        Self {
            fast: ModeProfileConfig::fast(),
            balanced: ModeProfileConfig::balanced(),
            deep: ModeProfileConfig::deep(),
        }
    }
}

/// Resource budget for one mode
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModeProfileConfig {
    /// Overall stage timeout in milliseconds
    pub timeout_ms: u64,
    /// Passages requested from retrieval
    pub top_k: usize,
    /// Cache TTL for results produced at this mode, in seconds
    pub cache_ttl_s: u64,
    /// Generation token budget
    pub max_tokens: u32,
}

impl ModeProfileConfig {
    /// Default fast profile
    pub const fn fast() -> Self {
        Self {
            timeout_ms: 1_500,
            top_k: 4,
            cache_ttl_s: 300,
            max_tokens: 256,
        }
    }

    /// Default balanced profile
    pub const fn balanced() -> Self {
        Self {
            timeout_ms: 4_000,
            top_k: 8,
            cache_ttl_s: 900,
            max_tokens: 512,
        }
    }

    /// Default deep profile
    pub const fn deep() -> Self {
        Self {
            timeout_ms: 12_000,
            top_k: 16,
            cache_ttl_s: 1_800,
            max_tokens: 1_024,
        }
    }
}
