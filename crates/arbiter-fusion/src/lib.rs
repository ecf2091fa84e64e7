//! Multi-perspective retrieval fusion for the deep path
//!
//! Generates alternative phrasings of a query, retrieves for each
//! concurrently, merges the result lists with reciprocal rank fusion,
//! and optionally diversifies the merged set with maximum marginal
//! relevance before generation sees it.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod error;
pub mod mmr;
pub mod perspectives;
pub mod rrf;
mod search;

pub use error::FusionError;
pub use mmr::diversify;
pub use perspectives::{generate_perspectives, perspective_count};
pub use rrf::{DEFAULT_RRF_K, fuse};
pub use search::RagFusion;
