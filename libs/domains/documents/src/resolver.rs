use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::embedding::EmbeddingFunction;
use crate::error::{StoreError, StoreResult};
use crate::metadata::{Metadata, MetadataValue};
use crate::models::{COLLECTION_DESCRIPTION, DistanceMetric};
use crate::store::{Collection, VectorStoreClient};

/// Process-wide locks keyed by collection name.
///
/// Resolution and deletion of the same name never interleave, so two
/// concurrent first requests cannot both miss the lookup and both create.
#[derive(Default)]
pub struct CollectionLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

static COLLECTION_LOCKS: Lazy<CollectionLocks> = Lazy::new(CollectionLocks::default);

impl CollectionLocks {
    pub fn global() -> &'static CollectionLocks {
        &COLLECTION_LOCKS
    }

    pub async fn acquire(&self, name: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            locks
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

/// Metadata attached to the collection when it is created
pub fn collection_metadata() -> Metadata {
    Metadata::from([
        (
            "description".to_string(),
            MetadataValue::from(COLLECTION_DESCRIPTION),
        ),
        (
            "hnsw:space".to_string(),
            MetadataValue::from(DistanceMetric::Cosine.as_str()),
        ),
    ])
}

/// Resolves the single well-known collection, creating it on first use.
pub struct CollectionResolver<S: VectorStoreClient> {
    store: S,
    name: String,
    embedding: Arc<dyn EmbeddingFunction>,
    locks: &'static CollectionLocks,
}

impl<S: VectorStoreClient> CollectionResolver<S> {
    pub fn new(store: S, name: impl Into<String>, embedding: Arc<dyn EmbeddingFunction>) -> Self {
        Self {
            store,
            name: name.into(),
            embedding,
            locks: CollectionLocks::global(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fetch the collection, or create it when the fetch fails for any reason.
    pub async fn resolve(&self) -> StoreResult<Arc<dyn Collection>> {
        let _guard = self.locks.acquire(&self.name).await;

        match self
            .store
            .get_collection(&self.name, self.embedding.clone())
            .await
        {
            Ok(collection) => Ok(collection),
            Err(err) => {
                tracing::info!(collection = %self.name, error = %err, "Collection unavailable, creating it");
                match self
                    .store
                    .create_collection(&self.name, self.embedding.clone(), collection_metadata())
                    .await
                {
                    // Created behind our back by another process
                    Err(StoreError::CollectionExists(_)) => {
                        self.store
                            .get_collection(&self.name, self.embedding.clone())
                            .await
                    }
                    other => other,
                }
            }
        }
    }

    /// The existing collection; never creates one.
    pub async fn existing(&self) -> StoreResult<Arc<dyn Collection>> {
        self.open(&self.name).await
    }

    /// Open any existing collection with the same embedding function attached.
    pub async fn open(&self, name: &str) -> StoreResult<Arc<dyn Collection>> {
        self.store.get_collection(name, self.embedding.clone()).await
    }

    /// Delete the collection and everything in it.
    pub async fn delete(&self) -> StoreResult<()> {
        let _guard = self.locks.acquire(&self.name).await;
        self.store.delete_collection(&self.name).await
    }
}
