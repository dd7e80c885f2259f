pub mod chunk;
pub mod download;
pub mod ingest;
pub mod models;
pub mod search;
pub mod stats;
pub mod story;

use std::path::{Path, PathBuf};
use std::time::Duration;
use storyloom_core::{OllamaClient, OllamaEmbedder, StoryloomConfig, VectorStore};

/// Default directory for downloaded books
pub fn library_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("library")
}

pub fn ollama_client(config: &StoryloomConfig) -> anyhow::Result<OllamaClient> {
    Ok(OllamaClient::new(
        config.ollama.host.clone(),
        Duration::from_secs(config.ollama.timeout_secs),
    )?)
}

pub fn embedder(config: &StoryloomConfig) -> anyhow::Result<OllamaEmbedder> {
    Ok(OllamaEmbedder::new(
        ollama_client(config)?,
        config.ollama.embedding_model.clone(),
        config.ollama.embedding_dim,
    ))
}

pub fn open_store(config: &StoryloomConfig, data_dir: &Path) -> anyhow::Result<VectorStore> {
    let path = config.store.resolve(data_dir);
    Ok(VectorStore::open(&path, config.ollama.embedding_dim)?)
}

/// Shorten text to `max_chars` characters for display
pub fn truncate(s: &str, max_chars: usize) -> String {
    let flat = s.replace('\n', " ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let cut: String = flat.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
