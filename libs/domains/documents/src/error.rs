use axum::response::{IntoResponse, Response};
use axum_helpers::{AppError, ErrorCode};
use std::fmt;
use thiserror::Error;

/// Failures reported by a vector store client, its collections, or an
/// embedding function.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("vector store returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Collection {0} does not exist")]
    CollectionNotFound(String),

    #[error("Collection {0} already exists")]
    CollectionExists(String),

    #[error("embedding error: {0}")]
    Embedding(String),

    #[error("unexpected vector store response: {0}")]
    Decode(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Decode(err.to_string())
    }
}

/// The document operation a store failure interrupted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreAction {
    Add,
    Query,
    Delete,
    Inspect,
}

impl StoreAction {
    /// Metric label
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreAction::Add => "add",
            StoreAction::Query => "query",
            StoreAction::Delete => "delete",
            StoreAction::Inspect => "inspect",
        }
    }
}

impl fmt::Display for StoreAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            StoreAction::Add => "Failed to add documents",
            StoreAction::Query => "Failed to query documents",
            StoreAction::Delete => "Failed to delete collection",
            StoreAction::Inspect => "Failed to inspect collection",
        };
        f.write_str(message)
    }
}

#[derive(Debug, Error)]
pub enum DocumentError {
    /// Bad or missing input, raised before any store call
    #[error("{0}")]
    Validation(String),

    #[error("{action}: {source}")]
    Store {
        action: StoreAction,
        #[source]
        source: StoreError,
    },
}

pub type DocumentResult<T> = Result<T, DocumentError>;

impl DocumentError {
    pub fn validation(message: impl Into<String>) -> Self {
        DocumentError::Validation(message.into())
    }

    pub fn store(action: StoreAction) -> impl FnOnce(StoreError) -> Self {
        move |source| DocumentError::Store { action, source }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, DocumentError::Validation(_))
    }
}

/// Convert DocumentError to AppError for standardized HTTP error responses
impl From<DocumentError> for AppError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::Validation(msg) => AppError::BadRequest(msg),
            DocumentError::Store { action, source } => {
                let code = match &source {
                    StoreError::CollectionNotFound(_) => ErrorCode::CollectionNotFound,
                    StoreError::Embedding(_) => ErrorCode::EmbeddingError,
                    _ => ErrorCode::VectorStoreError,
                };
                AppError::Upstream {
                    code,
                    message: action.to_string(),
                    details: source.to_string(),
                }
            }
        }
    }
}

impl IntoResponse for DocumentError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}
