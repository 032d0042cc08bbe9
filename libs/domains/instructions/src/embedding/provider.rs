use async_trait::async_trait;

use crate::error::InstructionResult;

/// Turns text into a fixed-length vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Model identifier sent to the provider
    fn model(&self) -> &str;

    /// Generate the embedding for a single text
    async fn embed(&self, text: &str) -> InstructionResult<Vec<f32>>;
}
