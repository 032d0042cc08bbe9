//! Root banner, readiness probe and router assembly.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
};
use axum_helpers::server::{
    HealthCheckFuture, RouterOptions, create_router, health_router, run_health_checks,
};
use core_config::AppInfo;
use domain_instructions::{InstructionRepository, InstructionService, RootResponse, handlers};

/// Liveness banner at `/`.
pub async fn root_handler(State(app): State<AppInfo>) -> Json<RootResponse> {
    Json(RootResponse {
        message: format!("{} is running!", app.name),
        name: app.name.to_string(),
        version: app.version.to_string(),
    })
}

/// Readiness check that pings the vector store.
pub async fn ready_handler<R: InstructionRepository>(
    State(service): State<Arc<InstructionService<R>>>,
) -> Response {
    let checks: Vec<(&str, HealthCheckFuture<'_>)> = vec![(
        "qdrant",
        Box::pin(async {
            service
                .repository()
                .health_check()
                .await
                .map_err(|e| format!("Qdrant health check failed: {}", e))
        }),
    )];

    match run_health_checks(checks).await {
        Ok((status, json)) => (status, json).into_response(),
        Err((status, json)) => (status, json).into_response(),
    }
}

/// Creates a router with the /ready endpoint backed by the shared service.
pub fn ready_router<R: InstructionRepository + 'static>(
    service: Arc<InstructionService<R>>,
) -> Router {
    Router::new()
        .route("/ready", get(ready_handler::<R>))
        .with_state(service)
}

/// Builds the full application router.
///
/// - API routes and `/` get docs and middleware from `create_router`
/// - `/health`: liveness with app name/version
/// - `/ready`: readiness with a real Qdrant check
pub fn app<R: InstructionRepository + 'static>(
    service: InstructionService<R>,
    app_info: AppInfo,
    options: RouterOptions,
) -> Router {
    let service = Arc::new(service);

    let api_routes = handlers::router_with_shared(service.clone()).merge(
        Router::new()
            .route("/", get(root_handler))
            .with_state(app_info),
    );

    create_router::<handlers::ApiDoc>(api_routes, options)
        .merge(health_router(app_info))
        .merge(ready_router(service))
}
