//! Vector store client contract.
//!
//! A [`VectorStoreClient`] manages named collections. A [`Collection`] handle
//! carries the embedding function it was opened with and embeds documents and
//! query texts through it before they reach the store.

mod chroma;
mod config;
mod memory;

pub use chroma::{ChromaClient, ChromaConfig, DEFAULT_CHROMA_URL};
pub use config::StoreConfig;
pub use memory::InMemoryStore;

use async_trait::async_trait;
use std::sync::Arc;

use crate::embedding::EmbeddingFunction;
use crate::error::StoreResult;
use crate::metadata::Metadata;
use crate::models::{CollectionInfo, DistanceMetric, QueryBatch, StoredDocument};

/// Handle to one named collection
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Collection: Send + Sync {
    fn name(&self) -> String;

    fn metric(&self) -> DistanceMetric;

    /// Add a batch. `ids`, `documents` and `metadatas` are position-aligned;
    /// the batch is accepted or rejected as a whole.
    async fn add(
        &self,
        ids: Vec<String>,
        documents: Vec<String>,
        metadatas: Vec<Metadata>,
    ) -> StoreResult<()>;

    /// Nearest neighbours of each query text, closest first.
    async fn query(&self, query_texts: Vec<String>, n_results: usize) -> StoreResult<QueryBatch>;

    /// Every stored document, optionally with its embedding.
    async fn get(&self, include_embeddings: bool) -> StoreResult<Vec<StoredDocument>>;

    async fn count(&self) -> StoreResult<usize>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VectorStoreClient: Send + Sync {
    /// Liveness probe; returns the store's clock in nanoseconds.
    async fn heartbeat(&self) -> StoreResult<u64>;

    async fn list_collections(&self) -> StoreResult<Vec<CollectionInfo>>;

    /// Open an existing collection. Fails with `CollectionNotFound` when absent.
    async fn get_collection(
        &self,
        name: &str,
        embedding: Arc<dyn EmbeddingFunction>,
    ) -> StoreResult<Arc<dyn Collection>>;

    /// Create a collection. When it already exists a store either fails with
    /// `CollectionExists` or returns the existing collection.
    async fn create_collection(
        &self,
        name: &str,
        embedding: Arc<dyn EmbeddingFunction>,
        metadata: Metadata,
    ) -> StoreResult<Arc<dyn Collection>>;

    /// Delete a collection and everything in it. Fails with
    /// `CollectionNotFound` when absent.
    async fn delete_collection(&self, name: &str) -> StoreResult<()>;
}

#[async_trait]
impl<T> VectorStoreClient for Arc<T>
where
    T: VectorStoreClient + ?Sized,
{
    async fn heartbeat(&self) -> StoreResult<u64> {
        (**self).heartbeat().await
    }

    async fn list_collections(&self) -> StoreResult<Vec<CollectionInfo>> {
        (**self).list_collections().await
    }

    async fn get_collection(
        &self,
        name: &str,
        embedding: Arc<dyn EmbeddingFunction>,
    ) -> StoreResult<Arc<dyn Collection>> {
        (**self).get_collection(name, embedding).await
    }

    async fn create_collection(
        &self,
        name: &str,
        embedding: Arc<dyn EmbeddingFunction>,
        metadata: Metadata,
    ) -> StoreResult<Arc<dyn Collection>> {
        (**self).create_collection(name, embedding, metadata).await
    }

    async fn delete_collection(&self, name: &str) -> StoreResult<()> {
        (**self).delete_collection(name).await
    }
}
