use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Dimension of the vectors produced by the configured embedding model
pub const EMBEDDING_DIMENSION: usize = 768;

/// Representation of a vector embedding
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Embedding {
    pub values: Vec<f32>,
}

impl Embedding {
    /// An all-zero vector of the given length
    pub fn zeros(dimension: usize) -> Self {
        Embedding {
            values: vec![0.0; dimension],
        }
    }

    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    /// Whether this embedding can be stored in a collection of `dimension`
    pub fn has_dimension(&self, dimension: usize) -> bool {
        self.values.len() == dimension
    }
}

/// Anything that turns text into an embedding vector
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text
    async fn embed(&self, text: &str) -> Result<Embedding>;
}
