//! Local vector storage for storyloom using DuckDB
//!
//! Chunk embeddings are stored one component per column so cosine
//! similarity can be computed inside SQL.

pub mod traits;
pub mod vector;

pub use traits::*;
pub use vector::VectorStore;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] ::duckdb::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store has {actual} embedding columns, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Embedding dimension must be greater than zero")]
    InvalidDimension,

    #[error("Invalid vector: {0}")]
    InvalidVector(String),
}

impl StorageError {
    /// Validation failures reject one operation without touching the store
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            StorageError::DimensionMismatch { .. } | StorageError::InvalidVector(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;
