//! Instructions API
//!
//! HTTP gateway for storing system instructions and finding them again by
//! meaning.
//!
//! ## Architecture
//!
//! ```text
//! HTTP client
//!   ↓ (JSON)
//! axum router (routes.rs) + shared middleware (axum-helpers)
//!   ↓
//! InstructionService (domain_instructions)
//!   ↓                     ↓
//! QdrantRepository    OllamaProvider
//!   ↓ (gRPC)              ↓ (HTTP)
//! Qdrant              Ollama /api/embeddings
//! ```
//!
//! ## Modules
//!
//! - `config`: Environment-driven configuration
//! - `routes`: Root banner, readiness probe and router assembly
//! - `server`: Startup sequence and lifecycle

pub mod config;
pub mod routes;
pub mod server;

pub use config::Config;
pub use server::run;
