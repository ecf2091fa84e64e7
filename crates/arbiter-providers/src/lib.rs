//! Retrieval and generation backend clients
//!
//! Thin async clients over the vector search and text generation HTTP
//! APIs. Both sides are traits so the pipeline can be exercised against
//! in-memory fakes; the shipped implementations speak JSON over reqwest.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod error;
mod generation;
mod retrieval;
mod types;

use std::sync::Arc;

use arbiter_config::{GenerationProviderType, ProvidersConfig};

pub use error::{ProviderError, Result};
pub use generation::{GenerationProvider, OpenAiGenerationProvider};
pub use retrieval::{HttpRetrievalProvider, RetrievalProvider};
pub use types::{GenerationRequest, GenerationResponse, SearchRequest};

/// Providers assembled from configuration
///
/// Either side may be absent; the pipeline decides what it can run
/// without. Retrieval is required for any non-cached answer, generation
/// falls back to extractive answers when missing.
pub struct Providers {
    pub retrieval: Option<Arc<dyn RetrievalProvider>>,
    pub generation: Option<Arc<dyn GenerationProvider>>,
}

/// Build providers from configuration
pub fn build(config: &ProvidersConfig) -> Providers {
    let retrieval = config.retrieval.as_ref().map(|retrieval_config| {
        tracing::info!(index = %retrieval_config.index, "retrieval provider configured");
        Arc::new(HttpRetrievalProvider::new(retrieval_config)) as Arc<dyn RetrievalProvider>
    });

    let generation = config.generation.as_ref().map(|generation_config| {
        match generation_config.provider_type {
            GenerationProviderType::Openai => {
                tracing::info!(model = %generation_config.model, "generation provider configured");
                Arc::new(OpenAiGenerationProvider::new(generation_config)) as Arc<dyn GenerationProvider>
            }
        }
    });

    Providers { retrieval, generation }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_builds_no_providers() {
        let providers = build(&ProvidersConfig::default());
        assert!(providers.retrieval.is_none());
        assert!(providers.generation.is_none());
    }
}
