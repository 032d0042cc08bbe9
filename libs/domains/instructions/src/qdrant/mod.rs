mod client;
mod config;
mod payload;

pub use client::QdrantRepository;
pub use config::{
    DEFAULT_QDRANT_GRPC_PORT, DEFAULT_QDRANT_HOST, DEFAULT_QDRANT_REST_PORT,
    DEFAULT_QDRANT_TIMEOUT_SECS, QdrantConfig,
};
