//! Storage trait abstractions
//!
//! The ingest pipeline and retrieval code depend on [`VectorStorage`] rather
//! than on the DuckDB store directly.

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, super::StorageError>;

/// One persisted chunk with its embedding
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingRow {
    /// Unique row id, `<file stem>_<chunk index>`
    pub id: String,
    pub file_path: String,
    pub chunk_index: usize,
    pub chunk_text: String,
    /// SHA-256 hex digest of `chunk_text`
    pub hash: String,
    pub vector: Vec<f32>,
}

/// Similarity search result (the stored vector is not returned)
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: String,
    pub file_path: String,
    pub chunk_index: usize,
    pub chunk_text: String,
    pub hash: String,
    pub score: f64,
}

/// Per-file row count, for stats
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSummary {
    pub file_path: String,
    pub chunks: usize,
}

/// Trait for storing and querying chunk embeddings
pub trait VectorStorage: Send + Sync {
    /// Embedding dimension fixed for this store
    fn dimension(&self) -> usize;

    /// Insert a row, fully replacing any row with the same id
    fn insert_or_replace(&self, row: &EmbeddingRow) -> Result<()>;

    /// Delete a row by id (no-op when absent)
    fn delete(&self, id: &str) -> Result<()>;

    /// Delete every row of `file_path` whose chunk index is `>= from_index`
    fn delete_from_index(&self, file_path: &str, from_index: usize) -> Result<usize>;

    /// Stored vector for `id`, or a zero vector when the id is unknown
    fn get_by_id(&self, id: &str) -> Result<Vec<f32>>;

    /// Stored content hash for `id`
    fn get_hash(&self, id: &str) -> Result<Option<String>>;

    /// All rows for a file, ordered by chunk index
    fn search_by_file(&self, file_path: &str) -> Result<Vec<EmbeddingRow>>;

    /// Top `top_k` rows by cosine similarity to `query`
    fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchHit>>;

    fn count(&self) -> Result<usize>;

    fn list_files(&self) -> Result<Vec<FileSummary>>;
}
