pub mod catalog;
pub mod config;
pub mod embeddings;
mod http;
pub mod ollama;
pub mod pipeline;
pub mod storage;
pub mod story;

pub use catalog::{CatalogQuery, GutendexClient};
pub use config::StoryloomConfig;
pub use embeddings::{Embedder, TextChunker};
pub use ollama::{OllamaClient, OllamaEmbedder, OllamaGenerator};
pub use pipeline::{IngestPipeline, IngestReport};
pub use storage::{VectorStorage, VectorStore};
pub use story::{StoryWorkflow, TextGenerator};
