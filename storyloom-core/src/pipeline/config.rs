//! Ingest configuration

use crate::config::ChunkingConfig;
use crate::embeddings::ChunkerConfig;
use std::path::Path;

/// Configuration for the ingest pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct IngestConfig {
    pub chunker: ChunkerConfig,
    /// Strip Project Gutenberg header/footer before chunking
    pub strip_boilerplate: bool,
    /// Accepted file extensions, without the dot (empty accepts every file)
    pub extensions: Vec<String>,
}

impl IngestConfig {
    pub fn new(chunker: ChunkerConfig) -> Self {
        Self {
            chunker,
            strip_boilerplate: true,
            extensions: vec!["txt".to_string()],
        }
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.into().trim_start_matches('.').to_string())
            .collect();
        self
    }

    pub fn with_strip_boilerplate(mut self, strip: bool) -> Self {
        self.strip_boilerplate = strip;
        self
    }

    /// Whether `path` has one of the accepted extensions (case-insensitive)
    pub fn matches(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self::new(ChunkerConfig::default())
    }
}

impl From<&ChunkingConfig> for IngestConfig {
    fn from(chunking: &ChunkingConfig) -> Self {
        Self::new(chunking.chunker_config())
            .with_extensions(chunking.extensions.iter().cloned())
            .with_strip_boilerplate(chunking.strip_boilerplate)
    }
}
