//! Embedding model abstraction
//!
//! The ingest pipeline and semantic search only see the [`Embedder`] trait;
//! the Ollama-backed implementation lives in [`crate::ollama`].

use super::{EmbeddingError, Result};
use async_trait::async_trait;

/// Trait for embedding models (allows mocking)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Get the embedding dimension
    fn embedding_dim(&self) -> usize;

    /// Generate embeddings for a batch of texts, one vector per input, in order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Generate the embedding for a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        if vectors.len() != 1 {
            return Err(EmbeddingError::Count {
                expected: 1,
                actual: vectors.len(),
            });
        }
        Ok(vectors.remove(0))
    }
}

/// Check that every vector has the expected dimension
pub fn check_dimensions(vectors: &[Vec<f32>], expected: usize) -> Result<()> {
    match vectors.iter().find(|v| v.len() != expected) {
        Some(bad) => Err(EmbeddingError::Dimension {
            expected,
            actual: bad.len(),
        }),
        None => Ok(()),
    }
}

/// Mock embedding model for tests and offline runs (returns deterministic embeddings)
#[derive(Debug, Clone)]
pub struct MockEmbeddingModel {
    dim: usize,
}

impl MockEmbeddingModel {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    /// Generate a deterministic embedding based on text hash
    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        let hash = text
            .bytes()
            .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));

        let mut embedding: Vec<f32> = (0..self.dim)
            .map(|i| {
                let val = ((hash.wrapping_mul(i as u64 + 1)) % 1000) as f32 / 1000.0 - 0.5;
                val / (self.dim as f32).sqrt()
            })
            .collect();

        // L2 normalize
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            embedding.iter_mut().for_each(|x| *x /= norm);
        }

        embedding
    }
}

#[async_trait]
impl Embedder for MockEmbeddingModel {
    fn embedding_dim(&self) -> usize {
        self.dim
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }
}
