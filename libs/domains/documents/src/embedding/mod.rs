mod config;
mod hashing;
mod openai;
mod provider;

pub use config::{EmbeddingConfig, EmbeddingProviderKind};
pub use hashing::{DEFAULT_HASHING_DIMENSION, HashingEmbedding};
pub use openai::{OpenAIConfig, OpenAIEmbedding};
pub use provider::EmbeddingFunction;

#[cfg(test)]
pub use provider::MockEmbeddingFunction;
