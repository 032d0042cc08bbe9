//! Instructions Domain
//!
//! Stores system instructions in a vector database and retrieves them by
//! semantic similarity. Text is embedded by an external model server before
//! every write and every search.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐     ┌───────────────────┐
//! │   Service   │ ──▶ │ EmbeddingProvider │  ← Ollama /api/embeddings
//! └──────┬──────┘     └───────────────────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Qdrant (trait + implementations)
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use domain_instructions::{
//!     EmbeddingConfig, InstructionService, OllamaProvider, ServiceConfig, handlers,
//!     repository::InMemoryInstructionRepository,
//! };
//!
//! # fn build() -> domain_instructions::InstructionResult<()> {
//! let embedder = OllamaProvider::new(EmbeddingConfig::default())?;
//! let service = InstructionService::new(
//!     InMemoryInstructionRepository::new(),
//!     Arc::new(embedder),
//!     ServiceConfig::default(),
//! );
//!
//! let router = handlers::router(service);
//! # let _ = router;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod embedding;
pub mod error;
pub mod handlers;
pub mod models;
pub mod qdrant;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use config::{DEFAULT_COLLECTION, ServiceConfig};
pub use embedding::{EmbeddingConfig, EmbeddingProvider, OllamaProvider};
pub use error::{InstructionError, InstructionResult};
pub use models::{
    AddInstruction, Instruction, ListInstructions, Metadata, RootResponse, ScoredInstruction,
    SearchInstructions, StatusResponse,
};
pub use qdrant::{QdrantConfig, QdrantRepository};
pub use repository::{InMemoryInstructionRepository, InstructionRepository};
pub use service::InstructionService;
