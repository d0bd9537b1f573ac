//! Application state management.
//!
//! The state carries the configuration, the document service over the
//! configured vector store, and the console renderer.

use domain_documents::{ConsoleRenderer, DocumentService, VectorStoreClient};
use std::sync::Arc;

use crate::config::Config;

/// Store chosen at startup from `VECTOR_STORE`
pub type Store = Arc<dyn VectorStoreClient>;

/// Shared application state.
///
/// Cloned for each handler; every field is an `Arc` underneath.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded from environment variables
    pub config: Config,
    pub documents: Arc<DocumentService<Store>>,
    pub renderer: ConsoleRenderer,
}

impl AppState {
    /// Connect the store client and build the embedding function. No request
    /// reaches the store until the first operation or readiness probe.
    pub fn new(config: Config) -> eyre::Result<Self> {
        let store = config.store.connect()?;
        let embedding = config.embedding.build()?;
        let documents = DocumentService::new(store, config.collection_name.clone(), embedding);

        Ok(Self {
            config,
            documents: Arc::new(documents),
            renderer: ConsoleRenderer::new()?,
        })
    }
}
