//! Qdrant test infrastructure
//!
//! Provides a `TestQdrant` helper that starts a Qdrant container for testing.

use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage};

const QDRANT_IMAGE: &str = "qdrant/qdrant";
const QDRANT_TAG: &str = "v1.15.1";
const READY_LOG_LINE: &str = "gRPC listening on";
const GRPC_PORT: u16 = 6334;
const REST_PORT: u16 = 6333;

/// Test Qdrant wrapper that ensures proper cleanup
///
/// The container is automatically stopped and removed when this struct is dropped.
///
/// # Example
///
/// ```no_run
/// use test_utils::TestQdrant;
///
/// # async fn example() {
/// let qdrant = TestQdrant::new().await;
/// // Point a gRPC client at qdrant.grpc_url()
/// # }
/// ```
pub struct TestQdrant {
    #[allow(dead_code)]
    container: ContainerAsync<GenericImage>,
    grpc_url: String,
    rest_url: String,
}

impl TestQdrant {
    /// Create a new test Qdrant instance
    pub async fn new() -> Self {
        let container = qdrant_image()
            .start()
            .await
            .expect("Failed to start Qdrant container");

        let grpc_port = container
            .get_host_port_ipv4(GRPC_PORT)
            .await
            .expect("Failed to get Qdrant gRPC port");
        let rest_port = container
            .get_host_port_ipv4(REST_PORT)
            .await
            .expect("Failed to get Qdrant REST port");

        let grpc_url = format!("http://127.0.0.1:{}", grpc_port);
        let rest_url = format!("http://127.0.0.1:{}", rest_port);

        tracing::info!(grpc_port, rest_port, "Test Qdrant ready ({})", QDRANT_TAG);

        Self {
            container,
            grpc_url,
            rest_url,
        }
    }

    /// gRPC endpoint, the one the Rust client speaks
    pub fn grpc_url(&self) -> &str {
        &self.grpc_url
    }

    /// REST endpoint (dashboard lives under `/dashboard`)
    pub fn rest_url(&self) -> &str {
        &self.rest_url
    }
}

/// Qdrant image with both ports exposed, ready once gRPC is listening.
fn qdrant_image() -> GenericImage {
    GenericImage::new(QDRANT_IMAGE, QDRANT_TAG)
        .with_exposed_port(GRPC_PORT.tcp())
        .with_exposed_port(REST_PORT.tcp())
        .with_wait_for(WaitFor::message_on_stdout(READY_LOG_LINE))
}

// Container is automatically cleaned up when TestQdrant is dropped
impl Drop for TestQdrant {
    fn drop(&mut self) {
        tracing::debug!("Cleaning up test Qdrant container");
    }
}
