//! HTTP server initialization and lifecycle management
//!
//! Startup order matters: the default collection is ensured before the
//! listener binds, so a process that serves traffic always has it.

use std::sync::Arc;

use axum_helpers::server::create_app;
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_instructions::{InstructionService, OllamaProvider, QdrantRepository};
use eyre::{Result, WrapErr};
use tracing::info;

use crate::config::Config;
use crate::routes;

/// Run the HTTP server
///
/// 1. Installs color-eyre and loads configuration
/// 2. Sets up structured logging (JSON for prod, pretty for dev)
/// 3. Builds the Qdrant and Ollama clients
/// 4. Ensures the default collection
/// 5. Serves until SIGINT/SIGTERM
///
/// # Errors
///
/// Returns an error if configuration is invalid, a client cannot be built,
/// the default collection cannot be ensured, or the listener fails.
pub async fn run() -> Result<()> {
    // Install color-eyre first for colored error output (before any fallible operations)
    install_color_eyre();

    let config = Config::from_env()?;

    // Initialize tracing with ErrorLayer for span trace capture
    init_tracing(&config.environment);

    info!(url = %config.qdrant.url, "Configuring Qdrant client");
    let repository =
        QdrantRepository::new(&config.qdrant).wrap_err("Failed to build Qdrant client")?;

    info!(
        base_url = %config.embedding.base_url,
        model = %config.embedding.model,
        "Configuring embedding provider"
    );
    let embedder =
        OllamaProvider::new(config.embedding.clone()).wrap_err("Failed to build embedding client")?;

    let service = InstructionService::new(repository, Arc::new(embedder), config.service.clone());

    service
        .ensure_default_collection()
        .await
        .wrap_err_with(|| {
            format!(
                "Failed to ensure default collection '{}'",
                config.service.default_collection
            )
        })?;

    info!(dashboard = %config.qdrant.dashboard_url(), "Qdrant dashboard");

    let app = routes::app(service, config.app, config.router_options());

    create_app(app, &config.server)
        .await
        .wrap_err("Server error")?;

    info!("Instructions API shutdown complete");
    Ok(())
}
