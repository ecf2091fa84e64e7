//! Concurrent multi-perspective retrieval
//!
//! Fans the perspectives out to the retrieval backend concurrently, each
//! bounded by its own deadline and by the caller's cancellation token.
//! Failed or timed-out perspectives are dropped with a warn log; the
//! survivors are merged with reciprocal rank fusion.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio_util::sync::CancellationToken;

use arbiter_config::FusionConfig;
use arbiter_core::{Query, RetrievedPassage};
use arbiter_providers::{GenerationProvider, RetrievalProvider, SearchRequest};

use crate::error::FusionError;
use crate::perspectives::generate_perspectives;
use crate::rrf;

/// Multi-perspective fused search over one retrieval backend
pub struct RagFusion {
    retrieval: Arc<dyn RetrievalProvider>,
    generation: Option<Arc<dyn GenerationProvider>>,
    config: FusionConfig,
}

impl RagFusion {
    /// Create a fused searcher
    ///
    /// Without a generation provider every search runs single-perspective.
    pub fn new(
        retrieval: Arc<dyn RetrievalProvider>,
        generation: Option<Arc<dyn GenerationProvider>>,
        config: FusionConfig,
    ) -> Self {
        Self {
            retrieval,
            generation,
            config,
        }
    }

    /// Retrieve with `num_perspectives` phrasings and fuse the results
    ///
    /// Partial failures degrade; only a search where every perspective
    /// failed (or was cancelled) returns an error.
    pub async fn fused_search(
        &self,
        query: &Query,
        top_k: usize,
        num_perspectives: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<RetrievedPassage>, FusionError> {
        let perspectives = match &self.generation {
            Some(generation) if num_perspectives >= 2 => {
                generate_perspectives(generation.as_ref(), &query.text, num_perspectives, &self.config)
                    .await
            }
            _ => vec![query.text.clone()],
        };

        let timeout = Duration::from_millis(self.config.perspective_timeout_ms);
        let searches = perspectives.iter().enumerate().map(|(index, perspective)| {
            let request = SearchRequest {
                query_text: perspective.clone(),
                top_k,
                filter: query.filter.clone(),
                include_embeddings: true,
            };
            let retrieval = Arc::clone(&self.retrieval);

            async move {
                tokio::select! {
                    // Cancellation wins over a simultaneously ready search.
                    biased;
                    () = cancel.cancelled() => {
                        tracing::debug!(perspective = index, "perspective search cancelled");
                        None
                    }
                    result = tokio::time::timeout(timeout, retrieval.search(&request)) => {
                        match result {
                            Ok(Ok(passages)) => Some(passages),
                            Ok(Err(error)) => {
                                tracing::warn!(perspective = index, %error, "perspective search failed");
                                None
                            }
                            Err(_) => {
                                tracing::warn!(
                                    perspective = index,
                                    timeout_ms = self.config.perspective_timeout_ms,
                                    "perspective search timed out"
                                );
                                None
                            }
                        }
                    }
                }
            }
        });

        let result_sets: Vec<Vec<RetrievedPassage>> =
            join_all(searches).await.into_iter().flatten().collect();

        if result_sets.is_empty() {
            return Err(FusionError::AllPerspectivesFailed {
                attempted: perspectives.len(),
            });
        }

        let fused = rrf::fuse(&result_sets, self.config.rrf_k, top_k);
        tracing::debug!(
            perspectives = perspectives.len(),
            surviving_sets = result_sets.len(),
            fused = fused.len(),
            "fused search merged"
        );
        Ok(fused)
    }
}
