use thiserror::Error;

use arbiter_cache::CacheError;
use arbiter_core::ThresholdError;
use arbiter_routing::RoutingError;

/// Engine startup errors
///
/// The request path never returns these; every runtime failure degrades
/// to a lower-quality answer instead.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configured thresholds violate the ordering invariants
    #[error("invalid routing thresholds: {0}")]
    Thresholds(#[from] ThresholdError),

    /// Mode profile table failed validation
    #[error("invalid mode profiles: {0}")]
    Profiles(#[from] RoutingError),

    /// Response cache could not be constructed
    #[error("cache setup failed: {0}")]
    Cache(#[from] CacheError),
}
