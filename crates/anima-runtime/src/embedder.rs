//! Embedding collaborator – Ollama embeddings client.
//!
//! Implements the [`Embedder`] contract against Ollama's `/api/embeddings`
//! endpoint. The output dimension is fixed at construction time and every
//! response is validated against it; a model that produces the wrong width is
//! a configuration error, not something to paper over.

use anima_memory::{EmbedError, Embedder};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

/// Embeddings client for a local Ollama instance.
pub struct OllamaEmbedder {
    base_url: String,
    model: String,
    dimension: usize,
    client: reqwest::Client,
}

impl OllamaEmbedder {
    /// Create an embedder for `model` served at `base_url`, producing
    /// `dimension`-sized vectors (e.g. `"nomic-embed-text"`, 768).
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        dimension: usize,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            dimension,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let url = format!("{}/api/embeddings", self.base_url.trim_end_matches('/'));
        let body = EmbeddingRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    EmbedError::Unavailable(e.to_string())
                } else {
                    EmbedError::BadResponse(e.to_string())
                }
            })?
            .error_for_status()
            .map_err(|e| EmbedError::BadResponse(e.to_string()))?;

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbedError::BadResponse(e.to_string()))?;

        if parsed.embedding.len() != self.dimension {
            return Err(EmbedError::Dimension {
                expected: self.dimension,
                actual: parsed.embedding.len(),
            });
        }
        Ok(parsed.embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_is_fixed_at_construction() {
        let embedder = OllamaEmbedder::new("http://localhost:11434", "nomic-embed-text", 768);
        assert_eq!(embedder.dimension(), 768);
    }

    #[test]
    fn request_serializes_model_and_prompt() {
        let body = EmbeddingRequest {
            model: "nomic-embed-text",
            prompt: "remember this",
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"model\":\"nomic-embed-text\""));
        assert!(json.contains("\"prompt\":\"remember this\""));
    }

    #[test]
    fn response_parses_embedding_array() {
        let raw = r#"{"embedding":[0.1,0.2,0.3]}"#;
        let parsed: EmbeddingResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.embedding.len(), 3);
    }

    #[tokio::test]
    async fn unreachable_server_reports_unavailable() {
        let embedder = OllamaEmbedder::new("http://127.0.0.1:1", "nomic-embed-text", 768);
        let err = embedder.embed("text").await.unwrap_err();
        assert!(matches!(err, EmbedError::Unavailable(_)));
    }
}
