use arbiter_core::SearchFilter;

/// A single vector search call
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// Query text to embed and search with
    pub query_text: String,
    /// Maximum passages to return
    pub top_k: usize,
    /// Optional retrieval-scope restriction
    pub filter: Option<SearchFilter>,
    /// Ask the backend to return passage embeddings
    ///
    /// Only the deep path sets this; embeddings are large and the
    /// speculative path never diversifies.
    pub include_embeddings: bool,
}

/// A single text generation call
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// System instruction for the backend
    pub system_prompt: String,
    /// User-visible prompt, typically query plus retrieved context
    pub user_prompt: String,
    /// Completion token cap
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f64,
}

/// Generated completion plus token accounting when the backend reports it
#[derive(Debug, Clone)]
pub struct GenerationResponse {
    /// Completion text
    pub text: String,
    /// Prompt tokens consumed, when reported
    pub prompt_tokens: Option<u32>,
    /// Completion tokens produced, when reported
    pub completion_tokens: Option<u32>,
}
