use core_config::{ConfigError, FromEnv, env_or_default, env_parse, env_required};
use std::str::FromStr;
use std::sync::Arc;

use super::openai::{DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL};
use super::{
    DEFAULT_HASHING_DIMENSION, EmbeddingFunction, HashingEmbedding, OpenAIConfig, OpenAIEmbedding,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingProviderKind {
    Hashing,
    OpenAI,
}

impl FromStr for EmbeddingProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hashing" | "local" => Ok(EmbeddingProviderKind::Hashing),
            "openai" => Ok(EmbeddingProviderKind::OpenAI),
            other => Err(format!("unknown embedding provider '{other}' (expected hashing|openai)")),
        }
    }
}

/// Which embedding function to attach to the collection
#[derive(Debug, Clone)]
pub enum EmbeddingConfig {
    Hashing { dimension: usize },
    OpenAI(OpenAIConfig),
}

impl EmbeddingConfig {
    /// Construct the configured embedding function
    pub fn build(&self) -> Result<Arc<dyn EmbeddingFunction>, ConfigError> {
        match self {
            EmbeddingConfig::Hashing { dimension } => HashingEmbedding::new(*dimension)
                .map(|e| Arc::new(e) as Arc<dyn EmbeddingFunction>)
                .map_err(|e| ConfigError::InvalidValue {
                    key: "EMBEDDING_DIMENSION".to_string(),
                    details: e.to_string(),
                }),
            EmbeddingConfig::OpenAI(config) => Ok(Arc::new(OpenAIEmbedding::new(config.clone()))),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        EmbeddingConfig::Hashing {
            dimension: DEFAULT_HASHING_DIMENSION,
        }
    }
}

impl FromEnv for EmbeddingConfig {
    /// - `EMBEDDING_PROVIDER`: `hashing` (default) or `openai`
    /// - `EMBEDDING_DIMENSION`: hashing dimension, or requested OpenAI output size
    /// - `OPENAI_API_KEY` (required for openai), `OPENAI_BASE_URL`, `OPENAI_EMBEDDING_MODEL`
    fn from_env() -> Result<Self, ConfigError> {
        let provider = env_parse::<EmbeddingProviderKind>("EMBEDDING_PROVIDER")?
            .unwrap_or(EmbeddingProviderKind::Hashing);
        let dimension = env_parse::<usize>("EMBEDDING_DIMENSION")?;

        match provider {
            EmbeddingProviderKind::Hashing => Ok(EmbeddingConfig::Hashing {
                dimension: dimension.unwrap_or(DEFAULT_HASHING_DIMENSION),
            }),
            EmbeddingProviderKind::OpenAI => {
                let mut config = OpenAIConfig::new(env_required("OPENAI_API_KEY")?)
                    .with_base_url(env_or_default("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL))
                    .with_model(env_or_default("OPENAI_EMBEDDING_MODEL", DEFAULT_OPENAI_MODEL));
                if let Some(dimension) = dimension {
                    let dimension = u32::try_from(dimension).map_err(|e| {
                        ConfigError::InvalidValue {
                            key: "EMBEDDING_DIMENSION".to_string(),
                            details: e.to_string(),
                        }
                    })?;
                    config = config.with_dimensions(dimension);
                }
                Ok(EmbeddingConfig::OpenAI(config))
            }
        }
    }
}
