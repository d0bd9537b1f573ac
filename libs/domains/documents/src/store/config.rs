use core_config::{ConfigError, FromEnv, env_parse};
use std::str::FromStr;
use std::sync::Arc;

use super::{ChromaClient, ChromaConfig, InMemoryStore, VectorStoreClient};
use crate::error::StoreResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StoreKind {
    Chroma,
    Memory,
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chroma" | "chromadb" => Ok(StoreKind::Chroma),
            "memory" | "in-memory" => Ok(StoreKind::Memory),
            other => Err(format!("unknown vector store '{other}' (expected chroma|memory)")),
        }
    }
}

/// Which vector store backs the service
#[derive(Debug, Clone, PartialEq)]
pub enum StoreConfig {
    Chroma(ChromaConfig),
    Memory,
}

impl StoreConfig {
    /// Connect the configured store. Nothing is sent over the wire here.
    pub fn connect(&self) -> StoreResult<Arc<dyn VectorStoreClient>> {
        match self {
            StoreConfig::Chroma(config) => {
                tracing::info!(url = %config.url, tenant = %config.tenant, database = %config.database, "Using Chroma vector store");
                Ok(Arc::new(ChromaClient::new(config.clone())?))
            }
            StoreConfig::Memory => {
                tracing::warn!("Using in-memory vector store; documents are lost on restart");
                Ok(Arc::new(InMemoryStore::new()))
            }
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Chroma(ChromaConfig::default())
    }
}

impl FromEnv for StoreConfig {
    /// `VECTOR_STORE` selects `chroma` (default) or `memory`; Chroma reads
    /// its own `CHROMA_*` variables.
    fn from_env() -> Result<Self, ConfigError> {
        match env_parse::<StoreKind>("VECTOR_STORE")?.unwrap_or(StoreKind::Chroma) {
            StoreKind::Chroma => Ok(StoreConfig::Chroma(ChromaConfig::from_env()?)),
            StoreKind::Memory => Ok(StoreConfig::Memory),
        }
    }
}
