use std::time::Duration;

use arbiter_config::{ModeProfileConfig, ModeProfilesConfig};
use arbiter_core::Mode;

use crate::error::RoutingError;

/// Resource budget for one mode
#[derive(Debug, Clone, Copy)]
pub struct ModeProfile {
    /// Overall stage deadline
    pub timeout: Duration,
    /// Passages requested from retrieval
    pub top_k: usize,
    /// Cache TTL for results produced at this mode
    pub cache_ttl: Duration,
    /// Generation token budget
    pub max_tokens: u32,
}

impl From<ModeProfileConfig> for ModeProfile {
    fn from(config: ModeProfileConfig) -> Self {
        Self {
            timeout: Duration::from_millis(config.timeout_ms),
            top_k: config.top_k,
            cache_ttl: Duration::from_secs(config.cache_ttl_s),
            max_tokens: config.max_tokens,
        }
    }
}

/// Static mode → profile table
///
/// Built once at startup; construction re-checks the monotonicity
/// invariants so a registry can never exist in an invalid state even
/// when assembled outside the config loader.
#[derive(Debug, Clone)]
pub struct ModeProfileRegistry {
    fast: ModeProfile,
    balanced: ModeProfile,
    deep: ModeProfile,
}

impl ModeProfileRegistry {
    /// Build the registry from configuration
    ///
    /// # Errors
    ///
    /// Returns `RoutingError::InvalidProfiles` if timeouts are not
    /// strictly increasing, top_k decreases, or fast.top_k is zero
    pub fn from_config(config: &ModeProfilesConfig) -> Result<Self, RoutingError> {
        let (fast, balanced, deep) = (config.fast, config.balanced, config.deep);

        if !(fast.timeout_ms < balanced.timeout_ms && balanced.timeout_ms < deep.timeout_ms) {
            return Err(RoutingError::InvalidProfiles(format!(
                "timeouts must be strictly increasing fast < balanced < deep (got {}, {}, {})",
                fast.timeout_ms, balanced.timeout_ms, deep.timeout_ms
            )));
        }

        if !(fast.top_k <= balanced.top_k && balanced.top_k <= deep.top_k) {
            return Err(RoutingError::InvalidProfiles(format!(
                "top_k must be non-decreasing fast <= balanced <= deep (got {}, {}, {})",
                fast.top_k, balanced.top_k, deep.top_k
            )));
        }

        if fast.top_k == 0 {
            return Err(RoutingError::InvalidProfiles("fast.top_k must be at least 1".to_owned()));
        }

        Ok(Self {
            fast: fast.into(),
            balanced: balanced.into(),
            deep: deep.into(),
        })
    }

    /// Look up the profile for a mode
    pub fn profile(&self, mode: Mode) -> &ModeProfile {
        match mode {
            Mode::Fast => &self.fast,
            Mode::Balanced => &self.balanced,
            Mode::Deep => &self.deep,
        }
    }
}
