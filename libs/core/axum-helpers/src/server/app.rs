use super::shutdown::shutdown_signal;
use crate::errors::handlers::{method_not_allowed, not_found};
use crate::http::{create_cors_layer, security_headers};
use axum::{Json, Router, http::HeaderValue, middleware, routing::get};
use core_config::server::ServerConfig;
use std::io;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::compression::CompressionLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info};
use utoipa::OpenApi;

/// Cross-cutting settings applied around the API routes.
#[derive(Clone, Debug)]
pub struct RouterOptions {
    pub cors_origins: Vec<HeaderValue>,
    pub max_concurrent_requests: usize,
}

/// Starts the Axum server with graceful shutdown.
///
/// # Errors
/// Returns an error if:
/// - The TCP listener fails to bind to the configured address
/// - The server encounters an error during operation
pub async fn create_app(router: Router, server_config: &ServerConfig) -> io::Result<()> {
    let listener = tokio::net::TcpListener::bind(server_config.address()).await?;

    info!("Server starting on {}", listener.local_addr()?);
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .inspect_err(|e| {
            tracing::error!("Server encountered an error: {:?}", e);
        })?;

    info!("Server stopped");
    Ok(())
}

/// Wraps API routes with documentation and common middleware.
///
/// This function sets up:
/// - The OpenAPI document at `/api-docs/openapi.json`
/// - Request tracing at `INFO`
/// - Security headers, CORS and response compression
/// - A global cap on in-flight requests
/// - JSON 404 and 405 fallbacks
///
/// Routes are mounted at the root. Health endpoints are merged in by the app
/// with [`health_router`](super::health_router) and its own readiness handler.
pub fn create_router<T>(apis: Router, options: RouterOptions) -> Router
where
    T: OpenApi + 'static,
{
    info!(
        origins = options.cors_origins.len(),
        max_concurrent_requests = options.max_concurrent_requests,
        "Configuring HTTP middleware"
    );

    Router::new()
        .route("/api-docs/openapi.json", get(|| async { Json(T::openapi()) }))
        .merge(apis)
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(GlobalConcurrencyLimitLayer::new(options.max_concurrent_requests))
        .layer(middleware::from_fn(security_headers))
        .layer(create_cors_layer(options.cors_origins))
        .layer(CompressionLayer::new())
}
