use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard};

use super::{Collection, VectorStoreClient};
use crate::embedding::EmbeddingFunction;
use crate::error::{StoreError, StoreResult};
use crate::metadata::{Metadata, MetadataValue};
use crate::models::{CollectionInfo, DistanceMetric, QueryBatch, StoredDocument};

#[derive(Debug, Clone)]
struct Record {
    id: String,
    document: String,
    metadata: Metadata,
    embedding: Vec<f32>,
}

type Collections = HashMap<String, Arc<CollectionData>>;

#[derive(Debug)]
struct CollectionData {
    name: String,
    metric: DistanceMetric,
    metadata: Metadata,
    records: RwLock<Vec<Record>>,
}

/// In-process vector store with brute-force search.
///
/// Follows the same collection rules as the Chroma server: opening or deleting
/// a missing collection fails, creating an existing one fails, ids already
/// present are skipped on add, and a handle to a deleted collection fails.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    collections: Arc<RwLock<Collections>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStoreClient for InMemoryStore {
    async fn heartbeat(&self) -> StoreResult<u64> {
        let nanos = chrono::Utc::now()
            .timestamp_nanos_opt()
            .and_then(|n| u64::try_from(n).ok())
            .unwrap_or_default();
        Ok(nanos)
    }

    async fn list_collections(&self) -> StoreResult<Vec<CollectionInfo>> {
        let collections = self.collections.read().await;
        let mut infos: Vec<CollectionInfo> = collections
            .values()
            .map(|c| CollectionInfo {
                name: c.name.clone(),
                metadata: c.metadata.clone(),
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(infos)
    }

    async fn get_collection(
        &self,
        name: &str,
        embedding: Arc<dyn EmbeddingFunction>,
    ) -> StoreResult<Arc<dyn Collection>> {
        let collections = self.collections.read().await;
        let data = collections
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::CollectionNotFound(name.to_string()))?;

        Ok(Arc::new(MemoryCollection {
            data,
            store: self.collections.clone(),
            embedding,
        }))
    }

    async fn create_collection(
        &self,
        name: &str,
        embedding: Arc<dyn EmbeddingFunction>,
        metadata: Metadata,
    ) -> StoreResult<Arc<dyn Collection>> {
        let mut collections = self.collections.write().await;
        if collections.contains_key(name) {
            return Err(StoreError::CollectionExists(name.to_string()));
        }

        let metric =
            DistanceMetric::from_space(metadata.get("hnsw:space").and_then(MetadataValue::as_str));
        let data = Arc::new(CollectionData {
            name: name.to_string(),
            metric,
            metadata,
            records: RwLock::new(Vec::new()),
        });
        collections.insert(name.to_string(), data.clone());

        tracing::debug!(collection = name, metric = metric.as_str(), "Created in-memory collection");
        Ok(Arc::new(MemoryCollection {
            data,
            store: self.collections.clone(),
            embedding,
        }))
    }

    async fn delete_collection(&self, name: &str) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        collections
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StoreError::CollectionNotFound(name.to_string()))
    }
}

struct MemoryCollection {
    data: Arc<CollectionData>,
    store: Arc<RwLock<Collections>>,
    embedding: Arc<dyn EmbeddingFunction>,
}

impl MemoryCollection {
    /// Read guard over the store, provided the name still maps to this
    /// collection. Holding it keeps a concurrent delete out.
    async fn live(&self) -> StoreResult<RwLockReadGuard<'_, Collections>> {
        let collections = self.store.read().await;
        match collections.get(&self.data.name) {
            Some(current) if Arc::ptr_eq(current, &self.data) => Ok(collections),
            _ => Err(StoreError::CollectionNotFound(self.data.name.clone())),
        }
    }
}

fn invalid(message: String) -> StoreError {
    StoreError::Api {
        status: 400,
        message,
    }
}

#[async_trait]
impl Collection for MemoryCollection {
    fn name(&self) -> String {
        self.data.name.clone()
    }

    fn metric(&self) -> DistanceMetric {
        self.data.metric
    }

    async fn add(
        &self,
        ids: Vec<String>,
        documents: Vec<String>,
        metadatas: Vec<Metadata>,
    ) -> StoreResult<()> {
        if ids.len() != documents.len() || ids.len() != metadatas.len() {
            return Err(invalid(format!(
                "Unequal lengths for fields: ids: {}, documents: {}, metadatas: {}",
                ids.len(),
                documents.len(),
                metadatas.len()
            )));
        }

        let mut seen = HashSet::new();
        if let Some(dup) = ids.iter().find(|id| !seen.insert(id.as_str())) {
            return Err(invalid(format!("Expected IDs to be unique, found duplicate: {dup}")));
        }

        // Embed before taking the lock so a failing embedding leaves no trace
        let embeddings = self.embedding.embed(&documents).await?;
        if embeddings.len() != documents.len() {
            return Err(StoreError::Embedding(format!(
                "expected {} embeddings, got {}",
                documents.len(),
                embeddings.len()
            )));
        }

        let _live = self.live().await?;
        let mut records = self.data.records.write().await;
        let existing: HashSet<String> = records.iter().map(|r| r.id.clone()).collect();

        for (((id, document), metadata), embedding) in
            ids.into_iter().zip(documents).zip(metadatas).zip(embeddings)
        {
            if existing.contains(&id) {
                tracing::warn!(id = %id, "Skipping add of existing id");
                continue;
            }
            records.push(Record {
                id,
                document,
                metadata,
                embedding,
            });
        }

        Ok(())
    }

    async fn query(&self, query_texts: Vec<String>, n_results: usize) -> StoreResult<QueryBatch> {
        let query_embeddings = self.embedding.embed(&query_texts).await?;
        let _live = self.live().await?;
        let records = self.data.records.read().await;
        let metric = self.data.metric;

        let mut batch = QueryBatch::default();
        for query in &query_embeddings {
            let mut scored: Vec<(f32, &Record)> = records
                .iter()
                .map(|r| (metric.distance(query, &r.embedding), r))
                .collect();
            scored.sort_by(|a, b| a.0.total_cmp(&b.0));
            scored.truncate(n_results);

            batch.ids.push(scored.iter().map(|(_, r)| r.id.clone()).collect());
            batch
                .documents
                .push(scored.iter().map(|(_, r)| r.document.clone()).collect());
            batch.distances.push(scored.iter().map(|(d, _)| *d).collect());
            batch
                .metadatas
                .push(scored.iter().map(|(_, r)| r.metadata.clone()).collect());
        }

        Ok(batch)
    }

    async fn get(&self, include_embeddings: bool) -> StoreResult<Vec<StoredDocument>> {
        let _live = self.live().await?;
        let records = self.data.records.read().await;
        Ok(records
            .iter()
            .map(|r| StoredDocument {
                id: r.id.clone(),
                document: Some(r.document.clone()),
                metadata: r.metadata.clone(),
                embedding: include_embeddings.then(|| r.embedding.clone()),
            })
            .collect())
    }

    async fn count(&self) -> StoreResult<usize> {
        let _live = self.live().await?;
        Ok(self.data.records.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbedding;
    use crate::metadata::index_metadata;

    fn embedding() -> Arc<dyn EmbeddingFunction> {
        Arc::new(HashingEmbedding::default())
    }

    fn cosine() -> Metadata {
        Metadata::from([("hnsw:space".to_string(), MetadataValue::from("cosine"))])
    }

    #[tokio::test]
    async fn test_get_missing_collection_fails() {
        let store = InMemoryStore::new();
        let err = store.get_collection("missing", embedding()).await.err().unwrap();
        assert!(matches!(err, StoreError::CollectionNotFound(name) if name == "missing"));
    }

    #[tokio::test]
    async fn test_create_twice_fails() {
        let store = InMemoryStore::new();
        store.create_collection("c", embedding(), cosine()).await.unwrap();
        let err = store.create_collection("c", embedding(), cosine()).await.err().unwrap();
        assert!(matches!(err, StoreError::CollectionExists(_)));
    }

    #[tokio::test]
    async fn test_delete_missing_fails_and_delete_removes() {
        let store = InMemoryStore::new();
        assert!(store.delete_collection("c").await.is_err());

        store.create_collection("c", embedding(), cosine()).await.unwrap();
        store.delete_collection("c").await.unwrap();
        assert!(store.list_collections().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_query_ranks_exact_match_first() {
        let store = InMemoryStore::new();
        let collection = store.create_collection("c", embedding(), cosine()).await.unwrap();
        assert_eq!(collection.metric(), DistanceMetric::Cosine);

        collection
            .add(
                vec!["a".into(), "b".into()],
                vec!["quarterly tax filing".into(), "hello world".into()],
                vec![index_metadata(0), index_metadata(1)],
            )
            .await
            .unwrap();

        let result = collection
            .query(vec!["hello world".into()], 5)
            .await
            .unwrap()
            .into_first();

        assert_eq!(result.ids[0], "b");
        assert!(result.distances[0].abs() < 1e-5);
        assert!(result.distances.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn test_query_limits_results() {
        let store = InMemoryStore::new();
        let collection = store.create_collection("c", embedding(), cosine()).await.unwrap();
        let ids: Vec<String> = (0..4).map(|i| format!("id{i}")).collect();
        let docs: Vec<String> = (0..4).map(|i| format!("document {i}")).collect();
        let metas = (0..4).map(index_metadata).collect();
        collection.add(ids, docs, metas).await.unwrap();

        let result = collection.query(vec!["document".into()], 2).await.unwrap().into_first();
        assert_eq!(result.len(), 2);
    }

    #[tokio::test]
    async fn test_add_rejects_duplicate_ids_in_batch() {
        let store = InMemoryStore::new();
        let collection = store.create_collection("c", embedding(), cosine()).await.unwrap();
        let err = collection
            .add(
                vec!["x".into(), "x".into()],
                vec!["one".into(), "two".into()],
                vec![index_metadata(0), index_metadata(1)],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Api { status: 400, .. }));
        assert_eq!(collection.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_add_rejects_unequal_lengths() {
        let store = InMemoryStore::new();
        let collection = store.create_collection("c", embedding(), cosine()).await.unwrap();
        let result = collection
            .add(vec!["x".into()], vec!["one".into(), "two".into()], vec![])
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_existing_ids_are_skipped() {
        let store = InMemoryStore::new();
        let collection = store.create_collection("c", embedding(), cosine()).await.unwrap();
        collection
            .add(vec!["x".into()], vec!["one".into()], vec![index_metadata(0)])
            .await
            .unwrap();
        collection
            .add(vec!["x".into()], vec!["other".into()], vec![index_metadata(0)])
            .await
            .unwrap();

        let stored = collection.get(false).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].document.as_deref(), Some("one"));
        assert!(stored[0].embedding.is_none());
    }

    #[tokio::test]
    async fn test_reopened_handle_sees_same_data() {
        let store = InMemoryStore::new();
        let created = store.create_collection("c", embedding(), cosine()).await.unwrap();
        created
            .add(vec!["x".into()], vec!["one".into()], vec![index_metadata(0)])
            .await
            .unwrap();

        let reopened = store.get_collection("c", embedding()).await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 1);
        let stored = reopened.get(true).await.unwrap();
        assert_eq!(stored[0].embedding.as_ref().unwrap().len(), 384);
    }

    #[tokio::test]
    async fn test_handle_to_deleted_collection_fails() {
        let store = InMemoryStore::new();
        let stale = store.create_collection("c", embedding(), cosine()).await.unwrap();
        store.delete_collection("c").await.unwrap();

        let err = stale
            .add(vec!["x".into()], vec!["one".into()], vec![index_metadata(0)])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::CollectionNotFound(name) if name == "c"));
        assert!(stale.count().await.is_err());

        // A recreated collection under the same name does not revive the old handle
        let fresh = store.create_collection("c", embedding(), cosine()).await.unwrap();
        assert!(stale.query(vec!["one".into()], 5).await.is_err());
        assert_eq!(fresh.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_default_metric_is_l2() {
        let store = InMemoryStore::new();
        let collection = store
            .create_collection("c", embedding(), Metadata::new())
            .await
            .unwrap();
        assert_eq!(collection.metric(), DistanceMetric::L2);
    }
}
