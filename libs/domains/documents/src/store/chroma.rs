use async_trait::async_trait;
use core_config::{ConfigError, FromEnv, env_or_default, env_parse};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

use super::{Collection, VectorStoreClient};
use crate::embedding::EmbeddingFunction;
use crate::error::{StoreError, StoreResult};
use crate::metadata::{Metadata, MetadataValue, flatten_for_store, metadata_from_store};
use crate::models::{CollectionInfo, DistanceMetric, QueryBatch, StoredDocument};

pub const DEFAULT_CHROMA_URL: &str = "http://localhost:8000";
pub const DEFAULT_CHROMA_TENANT: &str = "default_tenant";
pub const DEFAULT_CHROMA_DATABASE: &str = "default_database";

/// Chroma connection configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ChromaConfig {
    pub url: String,
    pub tenant: String,
    pub database: String,
    /// Per-request timeout; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

impl ChromaConfig {
    pub fn new(url: impl Into<String>) -> Self {
        let url: String = url.into();
        Self {
            url: url.trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    pub fn with_namespace(mut self, tenant: impl Into<String>, database: impl Into<String>) -> Self {
        self.tenant = tenant.into();
        self.database = database.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Default for ChromaConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_CHROMA_URL.to_string(),
            tenant: DEFAULT_CHROMA_TENANT.to_string(),
            database: DEFAULT_CHROMA_DATABASE.to_string(),
            timeout: None,
        }
    }
}

impl FromEnv for ChromaConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let mut config = ChromaConfig::new(env_or_default("CHROMA_URL", DEFAULT_CHROMA_URL))
            .with_namespace(
                env_or_default("CHROMA_TENANT", DEFAULT_CHROMA_TENANT),
                env_or_default("CHROMA_DATABASE", DEFAULT_CHROMA_DATABASE),
            );

        if let Some(secs) = env_parse::<u64>("CHROMA_TIMEOUT_SECS")? {
            config = config.with_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }
}

/// Chroma client speaking the v2 REST API.
///
/// Embeddings are computed client-side through the embedding function the
/// collection handle was opened with.
#[derive(Clone)]
pub struct ChromaClient {
    http: Client,
    config: Arc<ChromaConfig>,
}

impl ChromaClient {
    pub fn new(config: ChromaConfig) -> StoreResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &ChromaConfig {
        &self.config
    }

    fn collections_url(&self) -> String {
        format!(
            "{}/api/v2/tenants/{}/databases/{}/collections",
            self.config.url, self.config.tenant, self.config.database
        )
    }

    fn handle(
        &self,
        model: CollectionModel,
        embedding: Arc<dyn EmbeddingFunction>,
    ) -> Arc<dyn Collection> {
        let metric = model.metric();
        Arc::new(ChromaCollection {
            http: self.http.clone(),
            url: format!("{}/{}", self.collections_url(), model.id),
            name: model.name,
            metric,
            embedding,
        })
    }
}

#[derive(Debug, Deserialize)]
struct HeartbeatResponse {
    #[serde(rename = "nanosecond heartbeat")]
    nanosecond_heartbeat: u64,
}

#[derive(Debug, Deserialize)]
struct CollectionModel {
    id: String,
    name: String,
    #[serde(default)]
    metadata: Option<Value>,
    /// Newer servers also report the index space here
    #[serde(default)]
    configuration_json: Option<Value>,
}

impl CollectionModel {
    fn metadata(&self) -> Metadata {
        self.metadata
            .clone()
            .and_then(|m| metadata_from_store(m).ok())
            .unwrap_or_default()
    }

    fn metric(&self) -> DistanceMetric {
        let metadata = self.metadata();
        let configured = self
            .configuration_json
            .as_ref()
            .and_then(|c| c.pointer("/hnsw/space"))
            .and_then(Value::as_str);
        DistanceMetric::from_space(
            metadata
                .get("hnsw:space")
                .and_then(MetadataValue::as_str)
                .or(configured),
        )
    }
}

#[derive(Debug, Serialize)]
struct CreateCollectionRequest<'a> {
    name: &'a str,
    metadata: Option<Map<String, Value>>,
    get_or_create: bool,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Chroma rejects empty metadata objects; send `null` instead.
fn store_metadata(metadata: &Metadata) -> Option<Map<String, Value>> {
    (!metadata.is_empty()).then(|| flatten_for_store(metadata))
}

/// Map a non-success response onto a [`StoreError`].
async fn api_error(response: Response) -> StoreError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(ErrorBody {
            message: Some(message),
            ..
        }) => message,
        Ok(ErrorBody {
            error: Some(error), ..
        }) => error,
        _ => text,
    };

    StoreError::Api {
        status: status.as_u16(),
        message,
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> StoreResult<T> {
    if !response.status().is_success() {
        return Err(api_error(response).await);
    }
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn is_missing(err: &StoreError) -> bool {
    match err {
        StoreError::Api { status, message } => {
            *status == StatusCode::NOT_FOUND.as_u16() || message.contains("does not exist")
        }
        _ => false,
    }
}

#[async_trait]
impl VectorStoreClient for ChromaClient {
    async fn heartbeat(&self) -> StoreResult<u64> {
        let response = self
            .http
            .get(format!("{}/api/v2/heartbeat", self.config.url))
            .send()
            .await?;
        let body: HeartbeatResponse = read_json(response).await?;
        Ok(body.nanosecond_heartbeat)
    }

    async fn list_collections(&self) -> StoreResult<Vec<CollectionInfo>> {
        let response = self.http.get(self.collections_url()).send().await?;
        let models: Vec<CollectionModel> = read_json(response).await?;
        Ok(models
            .into_iter()
            .map(|m| CollectionInfo {
                metadata: m.metadata(),
                name: m.name,
            })
            .collect())
    }

    async fn get_collection(
        &self,
        name: &str,
        embedding: Arc<dyn EmbeddingFunction>,
    ) -> StoreResult<Arc<dyn Collection>> {
        let response = self
            .http
            .get(format!("{}/{}", self.collections_url(), name))
            .send()
            .await?;

        match read_json::<CollectionModel>(response).await {
            Ok(model) => Ok(self.handle(model, embedding)),
            Err(err) if is_missing(&err) => Err(StoreError::CollectionNotFound(name.to_string())),
            Err(err) => Err(err),
        }
    }

    async fn create_collection(
        &self,
        name: &str,
        embedding: Arc<dyn EmbeddingFunction>,
        metadata: Metadata,
    ) -> StoreResult<Arc<dyn Collection>> {
        let request = CreateCollectionRequest {
            name,
            metadata: store_metadata(&metadata),
            get_or_create: true,
        };
        let response = self
            .http
            .post(self.collections_url())
            .json(&request)
            .send()
            .await?;
        let model: CollectionModel = read_json(response).await?;

        tracing::info!(collection = %model.name, id = %model.id, "Chroma collection ready");
        Ok(self.handle(model, embedding))
    }

    async fn delete_collection(&self, name: &str) -> StoreResult<()> {
        let response = self
            .http
            .delete(format!("{}/{}", self.collections_url(), name))
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(());
        }

        let err = api_error(response).await;
        if is_missing(&err) {
            Err(StoreError::CollectionNotFound(name.to_string()))
        } else {
            Err(err)
        }
    }
}

struct ChromaCollection {
    http: Client,
    /// `.../collections/{id}`
    url: String,
    name: String,
    metric: DistanceMetric,
    embedding: Arc<dyn EmbeddingFunction>,
}

impl ChromaCollection {
    async fn embed(&self, texts: &[String]) -> StoreResult<Vec<Vec<f32>>> {
        let embeddings = self.embedding.embed(texts).await?;
        if embeddings.len() != texts.len() {
            return Err(StoreError::Embedding(format!(
                "{} returned {} embeddings for {} texts",
                self.embedding.name(),
                embeddings.len(),
                texts.len()
            )));
        }
        Ok(embeddings)
    }
}

#[derive(Debug, Serialize)]
struct AddRequest<'a> {
    ids: &'a [String],
    embeddings: Vec<Vec<f32>>,
    documents: &'a [String],
    metadatas: Vec<Option<Map<String, Value>>>,
}

#[derive(Debug, Serialize)]
struct QueryRequest {
    query_embeddings: Vec<Vec<f32>>,
    n_results: usize,
    include: &'static [&'static str],
}

#[derive(Debug, Default, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    ids: Vec<Vec<String>>,
    #[serde(default)]
    documents: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    distances: Option<Vec<Vec<Option<f32>>>>,
    #[serde(default)]
    metadatas: Option<Vec<Vec<Option<Value>>>>,
}

impl QueryResponse {
    fn into_batch(self) -> StoreResult<QueryBatch> {
        let documents: Vec<Vec<String>> = self
            .documents
            .unwrap_or_default()
            .into_iter()
            .map(|row| row.into_iter().map(Option::unwrap_or_default).collect())
            .collect();
        let distances: Vec<Vec<f32>> = self
            .distances
            .unwrap_or_default()
            .into_iter()
            .map(|row| row.into_iter().map(|d| d.unwrap_or(f32::MAX)).collect())
            .collect();
        let metadatas = self
            .metadatas
            .unwrap_or_default()
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|m| metadata_from_store(m.unwrap_or(Value::Null)))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        Ok(QueryBatch {
            ids: self.ids,
            documents,
            distances,
            metadatas,
        })
    }
}

#[derive(Debug, Serialize)]
struct GetRequest {
    include: Vec<&'static str>,
}

#[derive(Debug, Default, Deserialize)]
struct GetResponse {
    #[serde(default)]
    ids: Vec<String>,
    #[serde(default)]
    documents: Option<Vec<Option<String>>>,
    #[serde(default)]
    metadatas: Option<Vec<Option<Value>>>,
    #[serde(default)]
    embeddings: Option<Vec<Option<Vec<f32>>>>,
}

impl GetResponse {
    fn into_documents(self) -> StoreResult<Vec<StoredDocument>> {
        let mut documents = self.documents.unwrap_or_default().into_iter();
        let mut metadatas = self.metadatas.unwrap_or_default().into_iter();
        let mut embeddings = self.embeddings.unwrap_or_default().into_iter();

        self.ids
            .into_iter()
            .map(|id| {
                let metadata = metadata_from_store(metadatas.next().flatten().unwrap_or(Value::Null))
                    .map_err(|e| StoreError::Decode(e.to_string()))?;
                Ok(StoredDocument {
                    id,
                    document: documents.next().flatten(),
                    metadata,
                    embedding: embeddings.next().flatten(),
                })
            })
            .collect()
    }
}

#[async_trait]
impl Collection for ChromaCollection {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn metric(&self) -> DistanceMetric {
        self.metric
    }

    async fn add(
        &self,
        ids: Vec<String>,
        documents: Vec<String>,
        metadatas: Vec<Metadata>,
    ) -> StoreResult<()> {
        let embeddings = self.embed(&documents).await?;
        let request = AddRequest {
            ids: &ids,
            embeddings,
            documents: &documents,
            metadatas: metadatas.iter().map(store_metadata).collect(),
        };

        let response = self
            .http
            .post(format!("{}/add", self.url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(())
    }

    async fn query(&self, query_texts: Vec<String>, n_results: usize) -> StoreResult<QueryBatch> {
        let request = QueryRequest {
            query_embeddings: self.embed(&query_texts).await?,
            n_results,
            include: &["documents", "metadatas", "distances"],
        };

        let response = self
            .http
            .post(format!("{}/query", self.url))
            .json(&request)
            .send()
            .await?;
        let body: QueryResponse = read_json(response).await?;
        body.into_batch()
    }

    async fn get(&self, include_embeddings: bool) -> StoreResult<Vec<StoredDocument>> {
        let mut include = vec!["documents", "metadatas"];
        if include_embeddings {
            include.push("embeddings");
        }

        let response = self
            .http
            .post(format!("{}/get", self.url))
            .json(&GetRequest { include })
            .send()
            .await?;
        let body: GetResponse = read_json(response).await?;
        body.into_documents()
    }

    async fn count(&self) -> StoreResult<usize> {
        let response = self.http.get(format!("{}/count", self.url)).send().await?;
        read_json(response).await
    }
}
