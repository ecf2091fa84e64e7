#![allow(clippy::must_use_candidate)]

pub mod cache;
mod env;
pub mod fusion;
mod loader;
pub mod modes;
pub mod providers;
pub mod routing;
pub mod tuning;

use serde::Deserialize;

pub use cache::*;
pub use fusion::*;
pub use modes::*;
pub use providers::*;
pub use routing::*;
pub use tuning::*;

/// Top-level Arbiter configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Adaptive routing configuration
    #[serde(default)]
    pub routing: RoutingConfig,
    /// Per-mode resource profiles
    #[serde(default)]
    pub modes: ModeProfilesConfig,
    /// Response cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Retrieval and generation backend configuration
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Deep-retrieval fusion configuration
    #[serde(default)]
    pub fusion: FusionConfig,
    /// Threshold auto-tuning configuration
    #[serde(default)]
    pub tuning: TuningConfig,
}
