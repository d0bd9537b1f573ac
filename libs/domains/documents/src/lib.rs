//! Documents Domain
//!
//! Ingests free-text documents with optional metadata into a vector store
//! collection and answers semantic similarity queries against it.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐ ┌─────────────┐
//! │  Handlers   │ │   Console   │  ← JSON API / server-rendered form
//! └──────┬──────┘ └──────┬──────┘
//!        └───────┬───────┘
//!         ┌──────▼──────┐
//!         │   Service   │  ← Input preparation, metrics, error context
//!         └──────┬──────┘
//!         ┌──────▼──────┐
//!         │  Resolver   │  ← Single-flight get-or-create of the collection
//!         └──────┬──────┘
//!         ┌──────▼──────┐
//!         │    Store    │  ← Chroma over HTTP, or in-memory
//!         └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_documents::{
//!     DEFAULT_COLLECTION_NAME, DocumentService, HashingEmbedding, InMemoryStore, handlers,
//! };
//! use std::sync::Arc;
//!
//! let service = DocumentService::new(
//!     InMemoryStore::new(),
//!     DEFAULT_COLLECTION_NAME,
//!     Arc::new(HashingEmbedding::default()),
//! );
//! let router = handlers::router(Arc::new(service));
//! ```

pub mod console;
pub mod embedding;
pub mod error;
pub mod handlers;
pub mod ingest;
pub mod metadata;
pub mod models;
pub mod resolver;
pub mod service;
pub mod store;

pub use console::{ConsoleRenderer, RenderError};
pub use embedding::{EmbeddingConfig, EmbeddingFunction, HashingEmbedding, OpenAIEmbedding};
pub use error::{DocumentError, DocumentResult, StoreAction, StoreError, StoreResult};
pub use handlers::ApiDoc;
pub use metadata::{Metadata, MetadataValue};
pub use models::{
    AddOutcome, CollectionInfo, DEFAULT_COLLECTION_NAME, DistanceMetric, DocumentEntry,
    InspectionReport, QueryOutcome, QueryResult,
};
pub use resolver::CollectionResolver;
pub use service::DocumentService;
pub use store::{ChromaClient, ChromaConfig, Collection, InMemoryStore, StoreConfig, VectorStoreClient};
