use async_trait::async_trait;

use crate::error::StoreResult;

/// Text to fixed-length vector capability.
///
/// The same function is attached to a collection for both ingestion and
/// query so stored and query vectors share one space.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingFunction: Send + Sync {
    /// Short identifier for logs and diagnostics
    fn name(&self) -> String;

    /// Length of every vector this function produces
    fn dimensions(&self) -> usize;

    /// Embed texts in order; the output has one vector per input.
    async fn embed(&self, texts: &[String]) -> StoreResult<Vec<Vec<f32>>>;
}
