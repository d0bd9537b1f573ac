use observability::{DocumentMetrics, OperationTimer};
use std::sync::Arc;
use tracing::instrument;

use crate::embedding::EmbeddingFunction;
use crate::error::{DocumentError, DocumentResult, StoreAction, StoreResult};
use crate::ingest::{PreparedBatch, prepare_documents, prepare_entries};
use crate::metadata::Metadata;
use crate::models::{
    AddOutcome, CollectionInfo, DEFAULT_QUERY_LIMIT, DocumentEntry, InspectionReport,
    QueryOutcome,
};
use crate::resolver::CollectionResolver;
use crate::store::VectorStoreClient;

/// Parse a result-count bound. Absent, unparsable or zero values yield the default.
pub fn parse_limit(raw: Option<&str>) -> usize {
    raw.and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|limit| *limit > 0)
        .unwrap_or(DEFAULT_QUERY_LIMIT)
}

/// Document operations over the single well-known collection
pub struct DocumentService<S: VectorStoreClient> {
    resolver: CollectionResolver<S>,
}

impl<S: VectorStoreClient> DocumentService<S> {
    pub fn new(
        store: S,
        collection_name: impl Into<String>,
        embedding: Arc<dyn EmbeddingFunction>,
    ) -> Self {
        Self {
            resolver: CollectionResolver::new(store, collection_name, embedding),
        }
    }

    pub fn collection_name(&self) -> &str {
        self.resolver.name()
    }

    /// Add rows edited in the console
    #[instrument(skip(self, entries), fields(collection = %self.collection_name(), rows = entries.len()))]
    pub async fn ingest(&self, entries: &[DocumentEntry]) -> DocumentResult<AddOutcome> {
        let batch = prepare_entries(entries).inspect_err(log_rejection)?;
        self.add_batch(batch, "console").await
    }

    /// Add documents submitted through the JSON API
    #[instrument(skip(self, documents, metadatas), fields(collection = %self.collection_name(), documents = documents.len()))]
    pub async fn add_documents(
        &self,
        documents: Vec<String>,
        metadatas: Option<Vec<Metadata>>,
    ) -> DocumentResult<AddOutcome> {
        let batch = prepare_documents(documents, metadatas).inspect_err(log_rejection)?;
        self.add_batch(batch, "api").await
    }

    async fn add_batch(&self, batch: PreparedBatch, source: &str) -> DocumentResult<AddOutcome> {
        let _timer = OperationTimer::new("add");
        let count = batch.len();
        let PreparedBatch {
            ids,
            documents,
            metadatas,
        } = batch;

        let result = async {
            let collection = self.resolver.resolve().await?;
            collection.add(ids.clone(), documents, metadatas).await
        }
        .await;

        self.record_failure(StoreAction::Add, result)?;
        DocumentMetrics::record_ingested(source, count);
        tracing::info!(count, source, "Added documents");

        Ok(AddOutcome { ids, count })
    }

    /// Similarity search over the collection
    #[instrument(skip(self), fields(collection = %self.collection_name()))]
    pub async fn query(
        &self,
        query: Option<&str>,
        limit: Option<&str>,
    ) -> DocumentResult<QueryOutcome> {
        let query = match query.map(str::trim) {
            Some(q) if !q.is_empty() => q.to_string(),
            _ => {
                DocumentMetrics::record_query_rejected();
                let err = DocumentError::validation("query parameter is required");
                log_rejection(&err);
                return Err(err);
            }
        };
        let limit = parse_limit(limit);
        let _timer = OperationTimer::new("query");

        let result: StoreResult<_> = async {
            let collection = self.resolver.resolve().await?;
            let batch = collection.query(vec![query.clone()], limit).await?;
            Ok((collection.metric(), batch))
        }
        .await;

        let (metric, batch) = self.record_failure(StoreAction::Query, result)?;
        let results = batch.into_first();
        DocumentMetrics::record_query(results.len());
        tracing::debug!(hits = results.len(), limit, "Query completed");

        Ok(QueryOutcome {
            query,
            limit,
            metric,
            results,
        })
    }

    /// Delete the collection and everything in it. The next add or query
    /// recreates it empty.
    #[instrument(skip(self), fields(collection = %self.collection_name()))]
    pub async fn clear(&self) -> DocumentResult<()> {
        let _timer = OperationTimer::new("delete");
        let result = self.resolver.delete().await;
        self.record_failure(StoreAction::Delete, result)?;

        DocumentMetrics::record_reset();
        DocumentMetrics::set_collection_size(0);
        tracing::info!("Collection deleted");
        Ok(())
    }

    /// Report what the collection holds. Never creates the collection.
    #[instrument(skip(self), fields(collection = %self.collection_name()))]
    pub async fn inspect(&self) -> DocumentResult<InspectionReport> {
        let name = self.collection_name().to_string();
        self.inspect_named(&name).await
    }

    /// Report on every collection in the store
    pub async fn inspect_all(&self) -> DocumentResult<Vec<InspectionReport>> {
        let result = self.list_collections().await;
        let collections = self.record_failure(StoreAction::Inspect, result)?;
        let mut reports = Vec::with_capacity(collections.len());
        for info in collections {
            reports.push(self.inspect_named(&info.name).await?);
        }
        Ok(reports)
    }

    async fn inspect_named(&self, name: &str) -> DocumentResult<InspectionReport> {
        let _timer = OperationTimer::new("inspect");
        let result: StoreResult<_> = async {
            let collection = self.resolver.open(name).await?;
            let documents = collection.get(true).await?;
            Ok(InspectionReport::from_documents(
                collection.name(),
                collection.metric(),
                documents,
            ))
        }
        .await;

        let report = self.record_failure(StoreAction::Inspect, result)?;
        if name == self.collection_name() {
            DocumentMetrics::set_collection_size(report.count);
        }
        Ok(report)
    }

    /// Store liveness probe
    pub async fn heartbeat(&self) -> StoreResult<u64> {
        self.resolver.store().heartbeat().await
    }

    pub async fn list_collections(&self) -> StoreResult<Vec<CollectionInfo>> {
        self.resolver.store().list_collections().await
    }

    fn record_failure<T>(&self, action: StoreAction, result: StoreResult<T>) -> DocumentResult<T> {
        result.map_err(|source| {
            DocumentMetrics::record_store_error(action.as_str());
            tracing::error!(
                collection = %self.collection_name(),
                error = %source,
                "{action}"
            );
            DocumentError::store(action)(source)
        })
    }
}

fn log_rejection(err: &DocumentError) {
    tracing::info!(error = %err, "Rejected document request");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::{HashingEmbedding, MockEmbeddingFunction};
    use crate::metadata::index_metadata;
    use crate::error::StoreError;
    use crate::models::{DistanceMetric, QueryBatch};
    use crate::store::{Collection, InMemoryStore, MockCollection, MockVectorStoreClient};
    use std::collections::HashSet;

    fn embedding() -> Arc<dyn EmbeddingFunction> {
        Arc::new(HashingEmbedding::default())
    }

    fn memory_service(name: &str) -> DocumentService<InMemoryStore> {
        DocumentService::new(InMemoryStore::new(), name, embedding())
    }

    fn store_with(collection: MockCollection) -> MockVectorStoreClient {
        let collection: Arc<dyn Collection> = Arc::new(collection);
        let mut store = MockVectorStoreClient::new();
        store
            .expect_get_collection()
            .returning(move |_, _| Ok(collection.clone()));
        store
    }

    #[test]
    fn test_parse_limit() {
        assert_eq!(parse_limit(None), 5);
        assert_eq!(parse_limit(Some("abc")), 5);
        assert_eq!(parse_limit(Some("0")), 5);
        assert_eq!(parse_limit(Some("-3")), 5);
        assert_eq!(parse_limit(Some(" 12 ")), 12);
    }

    #[tokio::test]
    async fn test_all_blank_batch_makes_no_store_calls() {
        let mut store = MockVectorStoreClient::new();
        store.expect_get_collection().never();
        store.expect_create_collection().never();

        let service = DocumentService::new(store, "svc_blank", embedding());
        let err = service
            .ingest(&[DocumentEntry::new("  ", ""), DocumentEntry::new("", "{}")])
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let err = service.add_documents(vec![" ".into()], None).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_ingest_returns_unique_ids_for_kept_rows() {
        let mut collection = MockCollection::new();
        collection
            .expect_add()
            .withf(|ids, documents, metadatas| {
                ids.len() == 2 && documents == &["a".to_string(), "b".to_string()] && metadatas.len() == 2
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let service = DocumentService::new(store_with(collection), "svc_ids", embedding());
        let outcome = service
            .ingest(&[
                DocumentEntry::new("a", ""),
                DocumentEntry::new("", ""),
                DocumentEntry::new("b", ""),
            ])
            .await
            .unwrap();

        assert_eq!(outcome.count, 2);
        assert_eq!(outcome.ids.iter().collect::<HashSet<_>>().len(), 2);
        assert!(outcome.ids.iter().all(|id| id.starts_with("doc_")));
    }

    #[tokio::test]
    async fn test_add_failure_surfaces_store_error() {
        let mut collection = MockCollection::new();
        collection.expect_add().returning(|_, _, _| {
            Err(StoreError::Embedding("model unavailable".into()))
        });

        let service = DocumentService::new(store_with(collection), "svc_add_fail", embedding());
        let err = service.add_documents(vec!["doc".into()], None).await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to add documents: embedding error: model unavailable");
    }

    #[tokio::test]
    async fn test_query_requires_text() {
        let mut store = MockVectorStoreClient::new();
        store.expect_get_collection().never();

        let service = DocumentService::new(store, "svc_query_required", embedding());
        for query in [None, Some(""), Some("   ")] {
            let err = service.query(query, None).await.unwrap_err();
            assert_eq!(err.to_string(), "query parameter is required");
        }
    }

    #[tokio::test]
    async fn test_query_limit_defaults() {
        let mut collection = MockCollection::new();
        collection.expect_metric().returning(|| DistanceMetric::Cosine);
        collection
            .expect_query()
            .withf(|texts, n| texts == &["hello".to_string()] && *n == 5)
            .times(2)
            .returning(|_, _| Ok(QueryBatch::default()));

        let service = DocumentService::new(store_with(collection), "svc_limit", embedding());
        let outcome = service.query(Some("hello"), None).await.unwrap();
        assert_eq!(outcome.limit, 5);
        assert!(outcome.results.is_empty());

        let outcome = service.query(Some(" hello "), Some("abc")).await.unwrap();
        assert_eq!(outcome.limit, 5);
    }

    #[tokio::test]
    async fn test_query_failure_is_reported() {
        let mut collection = MockCollection::new();
        collection.expect_metric().returning(|| DistanceMetric::Cosine);
        collection.expect_query().returning(|_, _| {
            Err(StoreError::Api {
                status: 500,
                message: "index corrupted".into(),
            })
        });

        let service = DocumentService::new(store_with(collection), "svc_query_fail", embedding());
        let err = service.query(Some("x"), Some("3")).await.unwrap_err();
        assert!(matches!(
            err,
            DocumentError::Store {
                action: StoreAction::Query,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_query_uses_collection_embedding() {
        let mut embed = MockEmbeddingFunction::new();
        embed.expect_name().returning(|| "mock".into());
        embed.expect_dimensions().returning(|| 2);
        embed
            .expect_embed()
            .returning(|texts| Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect()));

        let service = DocumentService::new(InMemoryStore::new(), "svc_mock_embed", Arc::new(embed));
        service.add_documents(vec!["anything".into()], None).await.unwrap();
        let outcome = service.query(Some("other"), None).await.unwrap();
        assert_eq!(outcome.results.documents, vec!["anything"]);
        assert!(outcome.results.distances[0].abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_hello_world_round_trip() {
        let service = memory_service("svc_hello");
        service
            .ingest(&[
                DocumentEntry::new("The cat sat on the mat", ""),
                DocumentEntry::new("hello world", ""),
                DocumentEntry::new("Quarterly revenue grew", r#"{"category":"finance"}"#),
            ])
            .await
            .unwrap();

        let outcome = service.query(Some("hello world"), None).await.unwrap();
        let results = outcome.results;
        assert_eq!(outcome.metric, DistanceMetric::Cosine);
        assert_eq!(results.documents[0], "hello world");
        assert!(results.distances[0].abs() < 1e-4);
        assert_eq!(results.len(), 3);
        assert_eq!(results.documents.len(), results.distances.len());
        assert_eq!(results.metadatas.len(), results.ids.len());
    }

    #[tokio::test]
    async fn test_clear_then_query_is_empty() {
        let service = memory_service("svc_clear");
        service.add_documents(vec!["one".into()], None).await.unwrap();
        service.clear().await.unwrap();

        let outcome = service.query(Some("one"), None).await.unwrap();
        assert!(outcome.results.is_empty());
    }

    #[tokio::test]
    async fn test_clear_missing_collection_fails() {
        let service = memory_service("svc_clear_missing");
        let err = service.clear().await.unwrap_err();
        assert!(matches!(
            err,
            DocumentError::Store {
                action: StoreAction::Delete,
                source: StoreError::CollectionNotFound(_)
            }
        ));
    }

    #[tokio::test]
    async fn test_identical_texts_share_index() {
        let service = memory_service("svc_identical");
        service
            .ingest(&[DocumentEntry::new("same", ""), DocumentEntry::new("same", "")])
            .await
            .unwrap();

        let outcome = service.query(Some("same"), None).await.unwrap();
        assert_eq!(outcome.results.len(), 2);
        assert!(outcome.results.metadatas.iter().all(|m| *m == index_metadata(0)));
    }

    #[tokio::test]
    async fn test_inspect_reports_without_creating() {
        let service = memory_service("svc_inspect");
        assert!(service.inspect().await.is_err());
        assert!(service.list_collections().await.unwrap().is_empty());

        service
            .add_documents(vec!["alpha".into(), "beta".into()], None)
            .await
            .unwrap();
        let report = service.inspect().await.unwrap();
        assert_eq!(report.collection, "svc_inspect");
        assert_eq!(report.count, 2);
        assert_eq!(report.documents[0].embedding.as_ref().unwrap().dimension, 384);

        let all = service.inspect_all().await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_heartbeat_passes_through() {
        let mut store = MockVectorStoreClient::new();
        store.expect_heartbeat().returning(|| Ok(42));
        let service = DocumentService::new(store, "svc_heartbeat", embedding());
        assert_eq!(service.heartbeat().await.unwrap(), 42);
    }
}
