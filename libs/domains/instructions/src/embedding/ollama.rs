use std::time::Duration;

use async_trait::async_trait;
use core_config::{ConfigError, FromEnv, env_or_default, env_parse};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::EmbeddingProvider;
use crate::error::{InstructionError, InstructionResult};

pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://ollama:11434";
pub const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";
pub const DEFAULT_EMBEDDING_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_VECTOR_SIZE: u64 = 768;

/// Ollama embedding provider configuration
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    /// Expected vector length; responses of any other length are rejected
    pub dimension: u64,
}

impl EmbeddingConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_dimension(mut self, dimension: u64) -> Self {
        self.dimension = dimension;
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl FromEnv for EmbeddingConfig {
    /// Reads:
    /// - OLLAMA_BASE_URL: defaults to http://ollama:11434
    /// - EMBEDDING_MODEL_NAME: defaults to nomic-embed-text
    /// - EMBEDDING_TIMEOUT_SECS: defaults to 60
    /// - VECTOR_SIZE: defaults to 768
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: env_or_default("OLLAMA_BASE_URL", DEFAULT_OLLAMA_BASE_URL),
            model: env_or_default("EMBEDDING_MODEL_NAME", DEFAULT_EMBEDDING_MODEL),
            timeout_secs: env_parse("EMBEDDING_TIMEOUT_SECS", DEFAULT_EMBEDDING_TIMEOUT_SECS)?,
            dimension: env_parse("VECTOR_SIZE", DEFAULT_VECTOR_SIZE)?,
        })
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_BASE_URL.to_string(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            timeout_secs: DEFAULT_EMBEDDING_TIMEOUT_SECS,
            dimension: DEFAULT_VECTOR_SIZE,
        }
    }
}

/// Embeddings from an Ollama-compatible `/api/embeddings` endpoint
pub struct OllamaProvider {
    client: Client,
    config: EmbeddingConfig,
}

impl OllamaProvider {
    pub fn new(config: EmbeddingConfig) -> InstructionResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| InstructionError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn from_env() -> InstructionResult<Self> {
        Self::new(EmbeddingConfig::from_env()?)
    }

    fn endpoint(&self) -> String {
        format!("{}/api/embeddings", self.config.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for OllamaProvider {
    fn model(&self) -> &str {
        &self.config.model
    }

    #[instrument(skip(self, text), fields(model = %self.config.model, chars = text.len()))]
    async fn embed(&self, text: &str) -> InstructionResult<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(InstructionError::Validation(
                "text to embed must not be empty".to_string(),
            ));
        }

        let request = EmbeddingRequest {
            model: &self.config.model,
            prompt: text,
        };

        let response = self
            .client
            .post(self.endpoint())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(InstructionError::Embedding(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        let body: EmbeddingResponse = response.json().await.map_err(|e| {
            InstructionError::Embedding(format!("Malformed embedding response: {}", e))
        })?;

        if body.embedding.is_empty() {
            return Err(InstructionError::Embedding(
                "Provider returned an empty embedding".to_string(),
            ));
        }

        if body.embedding.len() as u64 != self.config.dimension {
            return Err(InstructionError::Embedding(format!(
                "Expected {} dimensions, provider returned {}",
                self.config.dimension,
                body.embedding.len()
            )));
        }

        tracing::debug!(dimension = body.embedding.len(), "Embedding generated");
        Ok(body.embedding)
    }
}
