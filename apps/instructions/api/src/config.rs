use axum::http::HeaderValue;
use axum_helpers::{DEFAULT_CORS_ORIGINS, RouterOptions, parse_origins};
use core_config::{AppInfo, FromEnv, app_info, env_optional, server::ServerConfig};
use domain_instructions::{EmbeddingConfig, QdrantConfig, ServiceConfig};
use eyre::{WrapErr, eyre};

// Re-export Environment for use in other modules
pub use core_config::Environment;

/// Application-specific configuration
/// Composes shared config components from `core_config` and the instructions domain
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub environment: Environment,
    pub server: ServerConfig,
    pub qdrant: QdrantConfig,
    pub embedding: EmbeddingConfig,
    pub service: ServiceConfig,
    pub cors_origins: Vec<HeaderValue>,
}

impl Config {
    /// Reads every setting once; nothing is looked up from the environment afterwards.
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        // HOST=0.0.0.0, PORT=8080
        let server = ServerConfig::from_env().wrap_err("Invalid server configuration")?;
        let qdrant = QdrantConfig::from_env().wrap_err("Invalid Qdrant configuration")?;
        let embedding = EmbeddingConfig::from_env().wrap_err("Invalid embedding configuration")?;
        let service = ServiceConfig::from_env().wrap_err("Invalid collection configuration")?;

        let raw_origins = env_optional("CORS_ALLOWED_ORIGIN")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.join(","));
        let cors_origins = parse_origins(&raw_origins)
            .map_err(|e| eyre!("Invalid CORS_ALLOWED_ORIGIN: {}", e))?;

        Ok(Self {
            app: app_info!(),
            environment,
            server,
            qdrant,
            embedding,
            service,
            cors_origins,
        })
    }

    pub fn router_options(&self) -> RouterOptions {
        RouterOptions {
            cors_origins: self.cors_origins.clone(),
            max_concurrent_requests: self.server.max_concurrent_requests,
        }
    }
}
