mod ollama;
mod provider;

pub use ollama::{
    DEFAULT_EMBEDDING_MODEL, DEFAULT_EMBEDDING_TIMEOUT_SECS, DEFAULT_OLLAMA_BASE_URL,
    DEFAULT_VECTOR_SIZE, EmbeddingConfig, OllamaProvider,
};
pub use provider::EmbeddingProvider;
