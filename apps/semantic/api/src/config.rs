use core_config::{AppInfo, FromEnv, app_info, env_or_default, server::ServerConfig};
use domain_documents::{DEFAULT_COLLECTION_NAME, EmbeddingConfig, StoreConfig};

// Re-export Environment for use in other modules
pub use core_config::Environment;

/// Application-specific configuration
/// Composes shared config components from the `config` library
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub server: ServerConfig,
    pub environment: Environment,
    pub store: StoreConfig,
    pub embedding: EmbeddingConfig,
    /// The one collection every operation works on
    pub collection_name: String,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?; // Uses defaults: HOST=0.0.0.0, PORT=8080
        let store = StoreConfig::from_env()?; // VECTOR_STORE, CHROMA_*
        let embedding = EmbeddingConfig::from_env()?; // EMBEDDING_*, OPENAI_*

        Ok(Self {
            app: app_info!(),
            server,
            environment,
            store,
            embedding,
            collection_name: env_or_default("COLLECTION_NAME", DEFAULT_COLLECTION_NAME),
        })
    }
}
