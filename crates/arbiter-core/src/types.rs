//! Core pipeline data model
//!
//! Everything here is created per request and immutable after
//! construction; the only mutation points in the system are the response
//! cache and the threshold snapshot, neither of which lives in this crate.

use serde::{Deserialize, Serialize};

/// Resource budget class for a query
///
/// Decided exactly once per query. Escalation issues a new downstream
/// call at a deeper profile; it never mutates the decided mode.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Mode {
    /// Cache + shallow retrieval + short completion
    Fast,
    /// Default budget
    Balanced,
    /// Multi-perspective retrieval and longer reasoning
    Deep,
}

/// Who produced a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    User,
    Assistant,
}

/// A single prior turn of conversation context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub text: String,
}

/// Retrieval-scope restriction forwarded to the retrieval backend
///
/// Participates in cache key construction: two queries with different
/// filters must never share a cached answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
    /// Restrict retrieval to these document ids (empty = unrestricted)
    #[serde(default)]
    pub source_document_ids: Vec<String>,
    /// Restrict retrieval to passages carrying all of these tags
    #[serde(default)]
    pub tags: Vec<String>,
}

impl SearchFilter {
    /// Whether the filter restricts anything at all
    pub fn is_empty(&self) -> bool {
        self.source_document_ids.is_empty() && self.tags.is_empty()
    }
}

/// Immutable per-request input
#[derive(Debug, Clone)]
pub struct Query {
    /// Raw query text
    pub text: String,
    /// Prior conversation turns, most-recent-last
    pub context: Vec<ConversationTurn>,
    /// Explicit mode override; wins over classification when present
    pub mode_override: Option<Mode>,
    /// Skip cache lookup and write for this request
    pub bypass_cache: bool,
    /// Optional retrieval-scope restriction
    pub filter: Option<SearchFilter>,
}

impl Query {
    /// Create a query with no context, override, or filter
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            context: Vec::new(),
            mode_override: None,
            bypass_cache: false,
            filter: None,
        }
    }

    /// Lowercased, whitespace-collapsed query text
    ///
    /// Used for cache keys and feature extraction so trivial formatting
    /// differences do not defeat caching.
    pub fn normalized_text(&self) -> String {
        self.text.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
    }
}

/// Feature vector behind a complexity score
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ComplexityFeatures {
    /// Query length normalized to [0, 1] via a token estimate
    pub length_norm: f64,
    /// Count of multi-hop / comparison lexical markers
    pub marker_count: usize,
    /// Query asks for an enumeration ("list", "steps", ...)
    pub list_cue: bool,
    /// Number of prior conversation turns
    pub context_depth: usize,
}

/// Complexity score in [0, 1] plus the features that produced it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComplexityScore {
    pub score: f64,
    pub features: ComplexityFeatures,
}

impl ComplexityScore {
    /// Minimum score with zeroed features, used for malformed input
    pub fn zero() -> Self {
        Self {
            score: 0.0,
            features: ComplexityFeatures::default(),
        }
    }
}

/// A scored passage returned by the retrieval backend
///
/// Owned by the retrieval call that produced it; fusion and
/// diversification take passages by value and never mutate them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedPassage {
    /// Stable passage identifier
    pub id: String,
    /// Passage text
    pub text: String,
    /// Backend relevance score (higher is better)
    pub score: f32,
    /// Document the passage was chunked from
    pub source_document_id: String,
    /// Passage embedding, when the backend returns one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

/// Result of one speculative (fast-path) attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeculativeResult {
    /// Generated or fallback answer text
    pub answer_text: String,
    /// Passages backing the answer, in relevance order
    pub passages: Vec<RetrievedPassage>,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Whether the answer came from the response cache
    pub cache_hit: bool,
    /// Wall-clock time spent producing this result
    pub elapsed_ms: u64,
}

/// Append-only record of one completed query, consumed by the tuner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingOutcome {
    pub mode: Mode,
    pub complexity_score: f64,
    pub confidence: f64,
    /// Whether the speculative result was escalated to deep retrieval
    pub escalated: bool,
    /// Confidence fell in the medium band and was accepted by tie-break
    pub ambiguous: bool,
    pub latency_ms: u64,
    /// Post-hoc satisfaction score in [0, 1], when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_feedback: Option<f64>,
}
