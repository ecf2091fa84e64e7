use arbiter_core::{RetrievedPassage, SearchFilter};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use url::Url;

use arbiter_config::RetrievalProviderConfig;

use crate::error::{ProviderError, Result};
use crate::types::SearchRequest;

/// Trait implemented by vector search backends
#[async_trait]
pub trait RetrievalProvider: Send + Sync {
    /// Run a similarity search and return scored passages
    async fn search(&self, request: &SearchRequest) -> Result<Vec<RetrievedPassage>>;

    /// Human-readable provider name
    fn name(&self) -> &str;
}

/// HTTP vector search provider
pub struct HttpRetrievalProvider {
    client: Client,
    base_url: Url,
    api_key: Option<SecretString>,
    index: String,
}

impl HttpRetrievalProvider {
    /// Create from provider configuration
    pub fn new(config: &RetrievalProviderConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.url.clone(),
            api_key: config.api_key.clone(),
            index: config.index.clone(),
        }
    }

    /// Build the search endpoint URL
    fn search_url(&self) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/search")
    }
}

/// Wire format for the search request
#[derive(Serialize)]
struct WireSearchRequest<'a> {
    index: &'a str,
    query: &'a str,
    top_k: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<&'a SearchFilter>,
    include_embeddings: bool,
}

/// Wire format for the search response
#[derive(Deserialize)]
struct WireSearchResponse {
    results: Vec<WirePassage>,
}

#[derive(Deserialize)]
struct WirePassage {
    id: String,
    text: String,
    score: f32,
    #[serde(default)]
    source_document_id: String,
    #[serde(default)]
    embedding: Option<Vec<f32>>,
}

#[async_trait]
impl RetrievalProvider for HttpRetrievalProvider {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<RetrievedPassage>> {
        let filter = request.filter.as_ref().filter(|f| !f.is_empty());
        let wire_request = WireSearchRequest {
            index: &self.index,
            query: &request.query_text,
            top_k: request.top_k,
            filter,
            include_embeddings: request.include_embeddings,
        };

        tracing::debug!(
            index = %self.index,
            top_k = request.top_k,
            filtered = filter.is_some(),
            "sending search request"
        );

        let mut builder = self.client.post(self.search_url()).json(&wire_request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!(error = %e, "search request failed");
            ProviderError::Upstream(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "search backend returned error");
            return Err(ProviderError::Upstream(format!("search backend returned {status}: {body}")));
        }

        let wire_response: WireSearchResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("failed to parse search response: {e}")))?;

        Ok(wire_response
            .results
            .into_iter()
            .map(|p| RetrievedPassage {
                id: p.id,
                text: p.text,
                score: p.score,
                source_document_id: p.source_document_id,
                embedding: p.embedding,
            })
            .collect())
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_is_omitted_from_the_wire() {
        let wire = WireSearchRequest {
            index: "kb",
            query: "capital of france",
            top_k: 4,
            filter: None,
            include_embeddings: false,
        };
        let json = serde_json::to_value(&wire).unwrap();
        assert!(json.get("filter").is_none());
        assert_eq!(json["top_k"], 4);
    }

    #[test]
    fn filter_serializes_document_ids_and_tags() {
        let filter = SearchFilter {
            source_document_ids: vec!["doc-1".to_owned()],
            tags: vec!["faq".to_owned()],
        };
        let wire = WireSearchRequest {
            index: "kb",
            query: "q",
            top_k: 8,
            filter: Some(&filter),
            include_embeddings: true,
        };
        let json = serde_json::to_value(&wire).unwrap();
        assert_eq!(json["filter"]["source_document_ids"][0], "doc-1");
        assert_eq!(json["filter"]["tags"][0], "faq");
        assert_eq!(json["include_embeddings"], true);
    }

    #[test]
    fn response_defaults_missing_fields() {
        let json = r#"{"results": [{"id": "p-1", "text": "Paris.", "score": 0.9}]}"#;
        let response: WireSearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].source_document_id, "");
        assert!(response.results[0].embedding.is_none());
    }

    #[test]
    fn search_url_strips_trailing_slash() {
        let config = RetrievalProviderConfig {
            url: Url::parse("http://search.internal/v1/").unwrap(),
            api_key: None,
            index: "kb".to_owned(),
        };
        let provider = HttpRetrievalProvider::new(&config);
        assert_eq!(provider.search_url(), "http://search.internal/v1/search");
    }
}
