//! Embeddings module for semantic search
//!
//! Provides text normalization, chunking, content hashing and the embedding
//! model abstraction.

pub mod chunker;
pub mod hash;
pub mod model;
pub mod normalize;

pub use chunker::{ChunkBudget, ChunkRecord, ChunkerConfig, ChunkerError, Chunks, TextChunker};
pub use hash::content_hash;
pub use model::{Embedder, MockEmbeddingModel};
pub use normalize::normalize;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Model error: {0}")]
    Model(String),

    #[error("Embedding has dimension {actual}, expected {expected}")]
    Dimension { expected: usize, actual: usize },

    #[error("Expected {expected} embeddings, got {actual}")]
    Count { expected: usize, actual: usize },

    #[error("Ollama error: {0}")]
    Ollama(#[from] crate::ollama::OllamaError),
}

pub type Result<T> = std::result::Result<T, EmbeddingError>;
