//! Observability utilities for the semantic document service.
//!
//! This crate provides:
//! - Prometheus metrics recording and export
//! - Document ingestion/query/reset metrics
//! - Axum middleware for automatic request metrics
//!
//! # Example
//!
//! ```rust,ignore
//! use observability::{init_metrics, metrics_handler, DocumentMetrics};
//!
//! init_metrics()?;
//!
//! DocumentMetrics::record_ingested("api", 3);
//!
//! let app = Router::new()
//!     .route("/metrics", get(metrics_handler));
//! ```

pub mod documents;
pub mod middleware;

pub use documents::{DocumentMetrics, OperationTimer};
pub use middleware::metrics_middleware;

// Re-export metrics macros for convenience
pub use metrics::{counter, gauge, histogram};

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::info;

static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the global Prometheus recorder.
///
/// Call once at startup; later calls return the existing handle.
pub fn init_metrics() -> Result<&'static PrometheusHandle, BuildError> {
    METRICS_HANDLE.get_or_try_init(|| {
        let handle = PrometheusBuilder::new().install_recorder()?;

        info!("Prometheus metrics recorder initialized");
        register_metric_descriptions();

        Ok(handle)
    })
}

/// Get the metrics handle (must call init_metrics first)
pub fn get_metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

/// Axum handler for /metrics endpoint
pub async fn metrics_handler() -> String {
    match get_metrics_handle() {
        Some(handle) => handle.render(),
        None => "# Metrics not initialized\n".to_string(),
    }
}

fn register_metric_descriptions() {
    use metrics::describe_counter;
    use metrics::describe_gauge;
    use metrics::describe_histogram;

    // HTTP metrics
    describe_counter!("http_requests_total", "Total number of HTTP requests");
    describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_counter!(
        "http_requests_errors_total",
        "Total number of HTTP request errors"
    );

    // Document metrics
    describe_counter!(
        "documents_ingested_total",
        "Documents added to the collection, by entry point"
    );
    describe_counter!(
        "document_queries_total",
        "Similarity queries issued, by outcome"
    );
    describe_histogram!(
        "document_operation_duration_seconds",
        "Document operation duration in seconds, by operation"
    );
    describe_histogram!(
        "document_query_results",
        "Number of results returned per query"
    );
    describe_counter!(
        "collection_resets_total",
        "Times the document collection was deleted"
    );
    describe_counter!(
        "document_store_errors_total",
        "Vector store failures by operation"
    );
    describe_gauge!(
        "collection_documents",
        "Documents in the collection at last inspection"
    );
}
