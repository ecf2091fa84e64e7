use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Retrieval and generation backend configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProvidersConfig {
    /// Vector search backend
    #[serde(default)]
    pub retrieval: Option<RetrievalProviderConfig>,
    /// Text generation backend
    #[serde(default)]
    pub generation: Option<GenerationProviderConfig>,
}

/// Configuration for the vector search backend
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetrievalProviderConfig {
    /// Search endpoint base URL
    pub url: Url,
    /// API key for the search service
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Index or collection name
    pub index: String,
}

/// Configuration for the generation backend
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationProviderConfig {
    /// Provider protocol type
    #[serde(rename = "type", default)]
    pub provider_type: GenerationProviderType,
    /// API key for authentication
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Base URL override
    #[serde(default)]
    pub base_url: Option<Url>,
    /// Model identifier sent to the backend
    pub model: String,
}

/// Supported generation backend protocols
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationProviderType {
    /// OpenAI-compatible chat completions API
    #[default]
    Openai,
}
