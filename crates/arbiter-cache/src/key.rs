use arbiter_core::{Mode, Query};
use sha2::{Digest, Sha256};

/// Fully-qualified cache key plus the namespace it belongs to
///
/// Rendered as `{prefix}:{namespace}:{mode}:{sha256}`. The hash covers
/// the normalized query text and the retrieval filter, so formatting
/// variants of the same question share an entry while filtered and
/// unfiltered lookups never do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    namespace: String,
    text: String,
}

impl CacheKey {
    /// Namespace segment, used to select the local tier
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Full key string, used verbatim in the shared tier
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

pub(crate) fn build(prefix: &str, namespace: &str, mode: Mode, query: &Query) -> CacheKey {
    let mut hasher = Sha256::new();
    hasher.update(query.normalized_text().as_bytes());

    if let Some(filter) = &query.filter {
        for id in &filter.source_document_ids {
            hasher.update(b"doc:");
            hasher.update(id.as_bytes());
        }
        for tag in &filter.tags {
            hasher.update(b"tag:");
            hasher.update(tag.as_bytes());
        }
    }

    let hash = hasher.finalize();
    CacheKey {
        namespace: namespace.to_owned(),
        text: format!("{prefix}:{namespace}:{mode}:{hash:x}"),
    }
}
