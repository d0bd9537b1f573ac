use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::EmbeddingFunction;
use crate::error::{StoreError, StoreResult};

pub const DEFAULT_HASHING_DIMENSION: usize = 384;

/// Deterministic local embedding by feature hashing.
///
/// Each lowercase alphanumeric token and each adjacent token pair is hashed
/// into a signed bucket; the vector is L2-normalized. Identical texts map to
/// identical vectors (cosine distance 0) and texts sharing words land close
/// together. Empty text yields the zero vector.
#[derive(Debug, Clone)]
pub struct HashingEmbedding {
    dimension: usize,
}

impl HashingEmbedding {
    pub fn new(dimension: usize) -> StoreResult<Self> {
        if dimension == 0 {
            return Err(StoreError::Embedding(
                "embedding dimension must be positive".to_string(),
            ));
        }
        Ok(Self { dimension })
    }

    fn tokens(text: &str) -> Vec<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
            .collect()
    }

    fn accumulate(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let digest = Sha256::digest(feature.as_bytes());
        let mut bucket = [0u8; 8];
        bucket.copy_from_slice(&digest[..8]);
        let index = (u64::from_le_bytes(bucket) % self.dimension as u64) as usize;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        vector[index] += sign * weight;
    }

    /// Embed one text synchronously.
    pub fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        let tokens = Self::tokens(text);

        for token in &tokens {
            self.accumulate(&mut vector, token, 1.0);
        }
        for pair in tokens.windows(2) {
            self.accumulate(&mut vector, &format!("{} {}", pair[0], pair[1]), 0.5);
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }
}

impl Default for HashingEmbedding {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_HASHING_DIMENSION,
        }
    }
}

#[async_trait]
impl EmbeddingFunction for HashingEmbedding {
    fn name(&self) -> String {
        "hashing".to_string()
    }

    fn dimensions(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, texts: &[String]) -> StoreResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}
