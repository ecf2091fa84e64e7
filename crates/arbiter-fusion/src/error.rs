use thiserror::Error;

/// Errors surfaced by the fusion pipeline
///
/// Individual perspective failures are absorbed with a warn log; an
/// error here means the whole fused search produced nothing usable.
#[derive(Debug, Error)]
pub enum FusionError {
    #[error("all {attempted} retrieval perspectives failed")]
    AllPerspectivesFailed { attempted: usize },
}
