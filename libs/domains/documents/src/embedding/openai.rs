use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::EmbeddingFunction;
use crate::error::{StoreError, StoreResult};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "text-embedding-3-small";

/// OpenAI embedding configuration
#[derive(Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    /// Requested output size; `None` uses the model's native size
    pub dimensions: Option<u32>,
}

impl std::fmt::Debug for OpenAIConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("dimensions", &self.dimensions)
            .finish()
    }
}

impl OpenAIConfig {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model: DEFAULT_OPENAI_MODEL.to_string(),
            dimensions: None,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    pub fn with_dimensions(mut self, dimensions: u32) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    /// Native output size of the known OpenAI embedding models
    fn native_dimensions(&self) -> usize {
        match self.model.as_str() {
            "text-embedding-3-large" => 3072,
            _ => 1536,
        }
    }
}

/// OpenAI embeddings over the `/embeddings` REST endpoint
pub struct OpenAIEmbedding {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIEmbedding {
    pub fn new(config: OpenAIConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[async_trait]
impl EmbeddingFunction for OpenAIEmbedding {
    fn name(&self) -> String {
        format!("openai:{}", self.config.model)
    }

    fn dimensions(&self) -> usize {
        self.config
            .dimensions
            .map(|d| d as usize)
            .unwrap_or_else(|| self.config.native_dimensions())
    }

    async fn embed(&self, texts: &[String]) -> StoreResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let request = EmbeddingRequest {
            model: &self.config.model,
            input: texts,
            dimensions: self.config.dimensions,
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| StoreError::Embedding(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(StoreError::Embedding(format!(
                "OpenAI API error ({}): {}",
                status, error_text
            )));
        }

        let embedding_response: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Embedding(e.to_string()))?;

        // Sort by index to maintain order
        let mut data = embedding_response.data;
        data.sort_by_key(|d| d.index);

        if data.len() != texts.len() {
            return Err(StoreError::Embedding(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                data.len()
            )));
        }

        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions_follow_model() {
        let small = OpenAIEmbedding::new(OpenAIConfig::new("key".into()));
        assert_eq!(small.dimensions(), 1536);

        let large = OpenAIEmbedding::new(
            OpenAIConfig::new("key".into()).with_model("text-embedding-3-large".into()),
        );
        assert_eq!(large.dimensions(), 3072);

        let reduced = OpenAIEmbedding::new(OpenAIConfig::new("key".into()).with_dimensions(256));
        assert_eq!(reduced.dimensions(), 256);
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let config = OpenAIConfig::new("key".into()).with_base_url("http://proxy.local/v1/".into());
        assert_eq!(config.base_url, "http://proxy.local/v1");
    }

    #[tokio::test]
    async fn test_empty_batch_skips_request() {
        let embedding = OpenAIEmbedding::new(
            OpenAIConfig::new("key".into()).with_base_url("http://127.0.0.1:9".into()),
        );
        assert!(embedding.embed(&[]).await.unwrap().is_empty());
    }

    #[test]
    fn test_request_omits_unset_dimensions() {
        let input = vec!["a".to_string()];
        let body = serde_json::to_value(EmbeddingRequest {
            model: DEFAULT_OPENAI_MODEL,
            input: &input,
            dimensions: None,
        })
        .unwrap();
        assert!(body.get("dimensions").is_none());
        assert_eq!(body["input"][0], "a");
    }
}
