use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::llm_config::EmbeddingConfig;

const OPENAI_EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";
const DEFAULT_OLLAMA_ENDPOINT: &str = "http://localhost:11434";

/// HTTP client for the external embedding provider
pub struct EmbeddingClient {
    config: EmbeddingConfig,
    http_client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct OpenAIEmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingResponse {
    data: Vec<OpenAIEmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct OllamaEmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl EmbeddingClient {
    pub fn new(config: EmbeddingConfig) -> Result<Self> {
        config.validate()?;

        tracing::info!(
            "🧮 Embedding service configured: {} ({}), batch size {}",
            config.provider,
            config.model,
            config.max_batch_size
        );

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn provider_name(&self) -> String {
        format!("{}/{}", self.config.provider, self.config.model)
    }

    /// Embed every text, preserving input order
    pub async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut embeddings = Vec::with_capacity(texts.len());
        for (batch_idx, batch) in texts.chunks(self.config.max_batch_size).enumerate() {
            tracing::debug!(
                "Embedding batch {} ({} texts) with {}",
                batch_idx + 1,
                batch.len(),
                self.provider_name()
            );

            let vectors = match self.config.provider.as_str() {
                "openai" => self.call_openai(batch).await?,
                "ollama" => self.call_ollama(batch).await?,
                other => anyhow::bail!("Unsupported embedding provider: {}", other),
            };

            if vectors.len() != batch.len() {
                anyhow::bail!(
                    "Embedding provider returned {} vectors for {} texts",
                    vectors.len(),
                    batch.len()
                );
            }
            embeddings.extend(vectors);
        }

        Ok(embeddings)
    }

    async fn call_openai(&self, batch: &[String]) -> Result<Vec<Vec<f32>>> {
        let api_key = self.config.api_key.as_ref()
            .ok_or_else(|| anyhow::anyhow!("OpenAI API key not configured"))?;

        // A configured endpoint points at an OpenAI-compatible gateway
        let url = match self.config.endpoint {
            Some(ref endpoint) => format!("{}/v1/embeddings", endpoint.trim_end_matches('/')),
            None => OPENAI_EMBEDDINGS_URL.to_string(),
        };

        let response = self.http_client
            .post(url)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&OpenAIEmbeddingRequest {
                model: &self.config.model,
                input: batch,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI embeddings API error {}: {}", status, body);
        }

        let parsed: OpenAIEmbeddingResponse = response.json().await?;
        Ok(order_by_index(parsed.data))
    }

    async fn call_ollama(&self, batch: &[String]) -> Result<Vec<Vec<f32>>> {
        let endpoint = self.config.endpoint.as_deref().unwrap_or(DEFAULT_OLLAMA_ENDPOINT);

        let response = self.http_client
            .post(format!("{}/api/embed", endpoint.trim_end_matches('/')))
            .json(&OllamaEmbedRequest {
                model: &self.config.model,
                input: batch,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama embed API error {}: {}", status, body);
        }

        let parsed: OllamaEmbedResponse = response.json().await?;
        Ok(parsed.embeddings)
    }
}

/// The OpenAI API tags each vector with its input position; don't rely on
/// response order
fn order_by_index(mut data: Vec<OpenAIEmbeddingData>) -> Vec<Vec<f32>> {
    data.sort_by_key(|d| d.index);
    data.into_iter().map(|d| d.embedding).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_by_index() {
        let response: OpenAIEmbeddingResponse = serde_json::from_str(
            r#"{"object": "list", "data": [
                {"object": "embedding", "index": 1, "embedding": [0.5, 0.5]},
                {"object": "embedding", "index": 0, "embedding": [1.0, 0.0]}
            ], "model": "text-embedding-3-small"}"#,
        )
        .unwrap();

        let vectors = order_by_index(response.data);
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.5, 0.5]]);
    }

    #[test]
    fn test_ollama_response_shape() {
        let response: OllamaEmbedResponse =
            serde_json::from_str(r#"{"model": "nomic-embed-text", "embeddings": [[0.1, 0.2]]}"#)
                .unwrap();
        assert_eq!(response.embeddings.len(), 1);
    }

    #[test]
    fn test_requires_api_key_for_openai() {
        assert!(EmbeddingClient::new(EmbeddingConfig::default()).is_err());
    }

    #[tokio::test]
    async fn test_empty_input_skips_network() {
        let client = EmbeddingClient::new(EmbeddingConfig {
            provider: "ollama".to_string(),
            model: "nomic-embed-text".to_string(),
            endpoint: Some("http://127.0.0.1:9".to_string()),
            ..Default::default()
        })
        .unwrap();

        let vectors = client.embed_texts(&[]).await.unwrap();
        assert!(vectors.is_empty());
    }
}
