//! Ollama HTTP adapters for embedding and classification

use async_trait::async_trait;
use fuserag_core::error::{FuseragError, Result};
use serde::{Deserialize, Serialize};

use crate::ports::{Embedder, IntentClassifier};

/// Ollama embedder implementation
pub struct OllamaEmbedder {
    /// Base URL for Ollama API (e.g., "http://localhost:11434")
    base_url: String,

    /// Model name to use for embeddings
    model: String,

    /// Embedding dimensions (model-specific)
    dimensions: usize,

    /// HTTP client
    client: reqwest::Client,
}

impl OllamaEmbedder {
    /// Create a new Ollama embedder
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, dimensions: usize) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            dimensions,
            client: reqwest::Client::new(),
        }
    }

    /// Create with default localhost URL
    pub fn localhost(model: impl Into<String>, dimensions: usize) -> Self {
        Self::new("http://localhost:11434", model, dimensions)
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());

        for text in texts {
            let request = OllamaEmbedRequest {
                model: self.model.clone(),
                prompt: text.to_string(),
            };

            let response = self
                .client
                .post(format!("{}/api/embeddings", self.base_url))
                .json(&request)
                .send()
                .await
                .map_err(|e| FuseragError::EmbedderUnavailable {
                    reason: format!("Failed to connect to Ollama: {}", e),
                    remediation: format!(
                        "Ensure Ollama is running at {} and the model '{}' is available. \
                         Run 'ollama pull {}' to download the model.",
                        self.base_url, self.model, self.model
                    ),
                })?;

            if !response.status().is_success() {
                let status = response.status();
                let error_text = response.text().await.unwrap_or_default();
                return Err(FuseragError::EmbedderUnavailable {
                    reason: format!("Ollama API error ({}): {}", status, error_text),
                    remediation: format!(
                        "Check that the model '{}' is available. Run 'ollama list' to see installed models.",
                        self.model
                    ),
                });
            }

            let embed_response: OllamaEmbedResponse =
                response.json().await.map_err(|e| FuseragError::EmbedderUnavailable {
                    reason: format!("Failed to parse Ollama response: {}", e),
                    remediation: "Check Ollama API compatibility".to_string(),
                })?;

            embeddings.push(embed_response.embedding);
        }

        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Request body for Ollama embeddings API
#[derive(Debug, Serialize)]
struct OllamaEmbedRequest {
    model: String,
    prompt: String,
}

/// Response from Ollama embeddings API
#[derive(Debug, Deserialize)]
struct OllamaEmbedResponse {
    embedding: Vec<f32>,
}

/// Ollama-backed query classifier.
///
/// Sends one generation request instructing the model to answer with
/// exactly one label from the closed set. The raw model output is
/// returned; label validation is the router's job.
pub struct OllamaClassifier {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaClassifier {
    /// Create a new Ollama classifier
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Create with default localhost URL
    pub fn localhost(model: impl Into<String>) -> Self {
        Self::new("http://localhost:11434", model)
    }

    fn classification_prompt(query: &str, labels: &[&str]) -> String {
        format!(
            "Classify the user query into exactly one of these categories: {}.\n\
             Answer with the category name only, in uppercase, with no\n\
             explanation and no punctuation.\n\n\
             Query: {}",
            labels.join(", "),
            query
        )
    }
}

#[async_trait]
impl IntentClassifier for OllamaClassifier {
    async fn classify(&self, query: &str, labels: &[&str]) -> Result<String> {
        let request = OllamaGenerateRequest {
            model: self.model.clone(),
            prompt: Self::classification_prompt(query, labels),
            stream: false,
            options: OllamaGenerateOptions { temperature: 0.0 },
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| FuseragError::ClassificationFailed {
                reason: format!("Failed to connect to Ollama: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(FuseragError::ClassificationFailed {
                reason: format!("Ollama API error ({}): {}", status, error_text),
            });
        }

        let generate_response: OllamaGenerateResponse =
            response.json().await.map_err(|e| FuseragError::ClassificationFailed {
                reason: format!("Failed to parse Ollama response: {}", e),
            })?;

        Ok(generate_response.response.trim().to_string())
    }
}

/// Request body for Ollama generate API
#[derive(Debug, Serialize)]
struct OllamaGenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: OllamaGenerateOptions,
}

#[derive(Debug, Serialize)]
struct OllamaGenerateOptions {
    temperature: f32,
}

/// Response from Ollama generate API
#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ollama_embedder_creation() {
        let embedder = OllamaEmbedder::localhost("nomic-embed-text", 768);
        assert_eq!(embedder.model_name(), "nomic-embed-text");
        assert_eq!(embedder.dimensions(), 768);
    }

    #[test]
    fn test_ollama_embedder_custom_url() {
        let embedder = OllamaEmbedder::new("http://custom:11434", "test-model", 512);
        assert_eq!(embedder.base_url, "http://custom:11434");
        assert_eq!(embedder.model_name(), "test-model");
    }

    #[test]
    fn test_classification_prompt_lists_labels() {
        let prompt = OllamaClassifier::classification_prompt(
            "how do I calibrate the scale?",
            &["CHAT", "PRECISION"],
        );
        assert!(prompt.contains("CHAT, PRECISION"));
        assert!(prompt.contains("how do I calibrate the scale?"));
    }
}
