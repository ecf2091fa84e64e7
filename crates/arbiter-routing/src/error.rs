use thiserror::Error;

/// Errors that can occur while building routing state
#[derive(Debug, Error)]
pub enum RoutingError {
    /// Mode profile table violates a monotonicity invariant
    #[error("invalid mode profiles: {0}")]
    InvalidProfiles(String),
}
