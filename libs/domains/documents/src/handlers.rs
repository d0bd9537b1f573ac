use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use axum_helpers::{
    ValidatedJson,
    errors::responses::{BadRequestValidationResponse, NotFoundResponse, StoreErrorResponse},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, OpenApi, ToSchema};
use validator::{Validate, ValidationError};

use crate::error::DocumentResult;
use crate::metadata::Metadata;
use crate::models::{InspectionReport, QueryResult};
use crate::service::DocumentService;
use crate::store::VectorStoreClient;

/// Mount point of the collection routes under `/api`
pub const URL: &str = "/collection";
pub const TAG: &str = "documents";

/// OpenAPI documentation for the document collection API
#[derive(OpenApi)]
#[openapi(
    paths(add_documents, query_documents, delete_collection, inspect_collection),
    components(
        schemas(
            AddDocumentsRequest,
            AddDocumentsResponse,
            QueryDocumentsResponse,
            DeleteCollectionResponse,
            InspectCollectionResponse,
            QueryResult,
            InspectionReport,
        ),
        responses(BadRequestValidationResponse, NotFoundResponse, StoreErrorResponse)
    ),
    tags((name = TAG, description = "Document ingestion and semantic search"))
)]
pub struct ApiDoc;

/// Body of `POST /collection`
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_metadatas_len"))]
pub struct AddDocumentsRequest {
    #[validate(required(message = "documents array is required"))]
    pub documents: Option<Vec<String>>,
    /// One metadata object per document
    #[schema(value_type = Option<Vec<Object>>)]
    pub metadatas: Option<Vec<Metadata>>,
}

fn validate_metadatas_len(request: &AddDocumentsRequest) -> Result<(), ValidationError> {
    match (&request.documents, &request.metadatas) {
        (Some(documents), Some(metadatas)) if documents.len() != metadatas.len() => {
            let mut err = ValidationError::new("metadatas_length");
            err.message = Some("metadatas must have the same length as documents".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AddDocumentsResponse {
    pub success: bool,
    #[schema(example = "Added 2 documents")]
    pub message: String,
    pub ids: Vec<String>,
    pub count: usize,
}

/// Query string of `GET /collection`
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct QueryParams {
    /// Free-text query
    pub query: Option<String>,
    /// Number of results; absent or non-numeric values fall back to 5
    pub limit: Option<String>,
    /// Alias of `limit`
    #[serde(rename = "nResults")]
    pub n_results: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QueryDocumentsResponse {
    pub success: bool,
    pub query: String,
    pub results: QueryResult,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteCollectionResponse {
    pub success: bool,
    #[schema(example = "Collection deleted successfully")]
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InspectCollectionResponse {
    pub success: bool,
    pub report: InspectionReport,
}

/// Create the collection router
pub fn router<S: VectorStoreClient + 'static>(service: Arc<DocumentService<S>>) -> Router {
    Router::new()
        .route(
            "/",
            get(query_documents::<S>)
                .post(add_documents::<S>)
                .delete(delete_collection::<S>),
        )
        .route("/inspect", get(inspect_collection::<S>))
        .with_state(service)
}

/// Add documents to the collection, creating it on first use
#[utoipa::path(
    post,
    path = "",
    tag = TAG,
    request_body = AddDocumentsRequest,
    responses(
        (status = 200, description = "Documents added", body = AddDocumentsResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = StoreErrorResponse)
    )
)]
async fn add_documents<S: VectorStoreClient>(
    State(service): State<Arc<DocumentService<S>>>,
    ValidatedJson(request): ValidatedJson<AddDocumentsRequest>,
) -> DocumentResult<Json<AddDocumentsResponse>> {
    let documents = request.documents.unwrap_or_default();
    let outcome = service.add_documents(documents, request.metadatas).await?;

    Ok(Json(AddDocumentsResponse {
        success: true,
        message: format!("Added {} documents", outcome.count),
        ids: outcome.ids,
        count: outcome.count,
    }))
}

/// Semantic similarity search
#[utoipa::path(
    get,
    path = "",
    tag = TAG,
    params(QueryParams),
    responses(
        (status = 200, description = "Ranked results, closest first", body = QueryDocumentsResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = StoreErrorResponse)
    )
)]
async fn query_documents<S: VectorStoreClient>(
    State(service): State<Arc<DocumentService<S>>>,
    Query(params): Query<QueryParams>,
) -> DocumentResult<Json<QueryDocumentsResponse>> {
    let limit = params.limit.as_deref().or(params.n_results.as_deref());
    let outcome = service.query(params.query.as_deref(), limit).await?;

    Ok(Json(QueryDocumentsResponse {
        success: true,
        query: outcome.query,
        results: outcome.results,
    }))
}

/// Delete the whole collection
#[utoipa::path(
    delete,
    path = "",
    tag = TAG,
    responses(
        (status = 200, description = "Collection deleted", body = DeleteCollectionResponse),
        (status = 500, response = StoreErrorResponse)
    )
)]
async fn delete_collection<S: VectorStoreClient>(
    State(service): State<Arc<DocumentService<S>>>,
) -> DocumentResult<Json<DeleteCollectionResponse>> {
    service.clear().await?;

    Ok(Json(DeleteCollectionResponse {
        success: true,
        message: "Collection deleted successfully".to_string(),
    }))
}

/// Report the stored documents and their embeddings
#[utoipa::path(
    get,
    path = "/inspect",
    tag = TAG,
    responses(
        (status = 200, description = "Collection contents", body = InspectCollectionResponse),
        (status = 500, response = StoreErrorResponse)
    )
)]
async fn inspect_collection<S: VectorStoreClient>(
    State(service): State<Arc<DocumentService<S>>>,
) -> DocumentResult<Json<InspectCollectionResponse>> {
    let report = service.inspect().await?;
    Ok(Json(InspectCollectionResponse {
        success: true,
        report,
    }))
}
