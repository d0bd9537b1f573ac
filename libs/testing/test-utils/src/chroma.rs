//! Chroma test infrastructure
//!
//! Provides a `TestChroma` helper that runs a Chroma server in a container.

use std::time::Duration;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, core::IntoContainerPort};

const CHROMA_IMAGE: &str = "chromadb/chroma";
const CHROMA_TAG: &str = "1.0.20";
const CHROMA_PORT: u16 = 8000;
const READY_ATTEMPTS: usize = 60;

/// Test Chroma wrapper that ensures proper cleanup
///
/// The container is stopped and removed when this struct is dropped.
///
/// # Example
///
/// ```no_run
/// use test_utils::TestChroma;
///
/// # async fn example() {
/// let chroma = TestChroma::new().await;
/// println!("Chroma listening on {}", chroma.url());
/// # }
/// ```
pub struct TestChroma {
    #[allow(dead_code)]
    container: ContainerAsync<GenericImage>,
    pub url: String,
}

impl TestChroma {
    /// Start a Chroma container and wait until its heartbeat answers
    pub async fn new() -> Self {
        let container = GenericImage::new(CHROMA_IMAGE, CHROMA_TAG)
            .with_exposed_port(CHROMA_PORT.tcp())
            .start()
            .await
            .expect("Failed to start Chroma container");

        let host_port = container
            .get_host_port_ipv4(CHROMA_PORT)
            .await
            .expect("Failed to get Chroma port");

        let url = format!("http://127.0.0.1:{}", host_port);
        wait_until_ready(&url).await;

        tracing::info!(port = host_port, "Test Chroma ready ({CHROMA_IMAGE}:{CHROMA_TAG})");

        Self { container, url }
    }

    /// Base URL of the server, without a trailing slash
    pub fn url(&self) -> &str {
        &self.url
    }
}

async fn wait_until_ready(url: &str) {
    let client = reqwest::Client::new();
    let heartbeat = format!("{url}/api/v2/heartbeat");

    for _ in 0..READY_ATTEMPTS {
        match client.get(&heartbeat).send().await {
            Ok(response) if response.status().is_success() => return,
            _ => tokio::time::sleep(Duration::from_millis(500)).await,
        }
    }

    panic!("Chroma did not become ready at {url}");
}

impl Drop for TestChroma {
    fn drop(&mut self) {
        tracing::debug!("Cleaning up test Chroma container");
    }
}
