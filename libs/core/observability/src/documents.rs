//! Metrics for document ingestion, similarity queries and collection resets.

use metrics::{counter, gauge, histogram};
use std::time::Instant;

/// Document operation metrics recorder
pub struct DocumentMetrics;

impl DocumentMetrics {
    /// Record a successful batch add. `source` is the entry point (`api`, `console`).
    pub fn record_ingested(source: &str, count: usize) {
        counter!("documents_ingested_total", "source" => source.to_string())
            .increment(count as u64);

        tracing::debug!(source = source, count = count, "Documents ingested");
    }

    /// Record a completed query and the number of hits it returned
    pub fn record_query(result_count: usize) {
        counter!("document_queries_total", "outcome" => "ok").increment(1);
        histogram!("document_query_results").record(result_count as f64);
    }

    /// Record a query that was rejected before reaching the store
    pub fn record_query_rejected() {
        counter!("document_queries_total", "outcome" => "rejected").increment(1);
    }

    pub fn record_reset() {
        counter!("collection_resets_total").increment(1);
    }

    /// Record a vector store failure for an operation (`add`, `query`, `delete`, `inspect`)
    pub fn record_store_error(operation: &str) {
        counter!("document_store_errors_total", "operation" => operation.to_string())
            .increment(1);
    }

    pub fn set_collection_size(count: usize) {
        gauge!("collection_documents").set(count as f64);
    }
}

/// Timer guard for automatic duration recording.
///
/// Records `document_operation_duration_seconds` when `stop()` is called or
/// when dropped, whichever comes first.
pub struct OperationTimer {
    start: Instant,
    operation: &'static str,
    stopped: bool,
}

impl OperationTimer {
    pub fn new(operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
            stopped: false,
        }
    }

    /// Stop the timer and record the duration. Returns duration in milliseconds.
    pub fn stop(&mut self) -> u64 {
        if self.stopped {
            return 0;
        }
        self.stopped = true;

        let duration = self.start.elapsed();
        histogram!(
            "document_operation_duration_seconds",
            "operation" => self.operation
        )
        .record(duration.as_secs_f64());

        duration.as_millis() as u64
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        if !self.stopped {
            self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusBuilder;

    #[test]
    fn test_ingested_counter_accumulates_per_source() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            DocumentMetrics::record_ingested("api", 2);
            DocumentMetrics::record_ingested("api", 1);
            DocumentMetrics::record_ingested("console", 4);
        });

        let rendered = handle.render();
        assert!(rendered.contains("documents_ingested_total{source=\"api\"} 3"));
        assert!(rendered.contains("documents_ingested_total{source=\"console\"} 4"));
    }

    #[test]
    fn test_timer_records_once() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            let mut timer = OperationTimer::new("query");
            timer.stop();
            assert_eq!(timer.stop(), 0);
        });

        let rendered = handle.render();
        assert!(rendered.contains("document_operation_duration_seconds_count{operation=\"query\"} 1"));
    }

    #[test]
    fn test_store_error_and_query_outcomes() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            DocumentMetrics::record_store_error("add");
            DocumentMetrics::record_query(3);
            DocumentMetrics::record_query_rejected();
        });

        let rendered = handle.render();
        assert!(rendered.contains("document_store_errors_total{operation=\"add\"} 1"));
        assert!(rendered.contains("document_queries_total{outcome=\"ok\"} 1"));
        assert!(rendered.contains("document_queries_total{outcome=\"rejected\"} 1"));
    }
}
