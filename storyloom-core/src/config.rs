//! storyloom configuration
//!
//! Loaded from TOML. Every field has a default, so a missing file or a
//! partial file both produce a usable config.

use crate::embeddings::{ChunkBudget, ChunkerConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "storyloom.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StoryloomConfig {
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub story: StoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OllamaConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_generation_model")]
    pub generation_model: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: usize,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_ollama_timeout")]
    pub timeout_secs: u64,
}

fn default_host() -> String { crate::ollama::DEFAULT_HOST.into() }
fn default_generation_model() -> String { "llama3.1".into() }
fn default_embedding_model() -> String { "nomic-embed-text".into() }
fn default_embedding_dim() -> usize { 768 }
fn default_temperature() -> f32 { 0.8 }
fn default_ollama_timeout() -> u64 { 300 }

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            generation_model: default_generation_model(),
            embedding_model: default_embedding_model(),
            embedding_dim: default_embedding_dim(),
            temperature: default_temperature(),
            timeout_secs: default_ollama_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkingConfig {
    #[serde(default = "default_max_size")]
    pub max_size: usize,
    #[serde(default = "default_overlap")]
    pub overlap: usize,
    #[serde(default)]
    pub budget: ChunkBudget,
    #[serde(default = "bool_true")]
    pub strip_boilerplate: bool,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_max_size() -> usize { 1024 }
fn default_overlap() -> usize { 128 }
fn bool_true() -> bool { true }
fn default_extensions() -> Vec<String> { vec!["txt".into(), "md".into()] }

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_size: default_max_size(),
            overlap: default_overlap(),
            budget: ChunkBudget::default(),
            strip_boilerplate: bool_true(),
            extensions: default_extensions(),
        }
    }
}

impl ChunkingConfig {
    pub fn chunker_config(&self) -> ChunkerConfig {
        ChunkerConfig {
            max_size: self.max_size,
            overlap: self.overlap,
            budget: self.budget,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
    /// Store file; relative paths resolve against the data directory
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

fn default_store_path() -> PathBuf { PathBuf::from("storyloom.duckdb") }

impl Default for StoreConfig {
    fn default() -> Self {
        Self { path: default_store_path() }
    }
}

impl StoreConfig {
    pub fn resolve(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_url")]
    pub base_url: String,
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    #[serde(default = "default_max_books")]
    pub max_books: usize,
    #[serde(default = "default_catalog_timeout")]
    pub timeout_secs: u64,
}

fn default_catalog_url() -> String { crate::catalog::DEFAULT_BASE_URL.into() }
fn default_languages() -> Vec<String> { vec!["en".into()] }
fn default_max_books() -> usize { 20 }
fn default_catalog_timeout() -> u64 { 60 }

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_catalog_url(),
            languages: default_languages(),
            max_books: default_max_books(),
            timeout_secs: default_catalog_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoryConfig {
    #[serde(default = "default_chapters")]
    pub chapters: usize,
    /// Retrieved passages per chapter prompt (0 disables retrieval)
    #[serde(default = "default_context_passages")]
    pub context_passages: usize,
}

fn default_chapters() -> usize { 5 }
fn default_context_passages() -> usize { 3 }

impl Default for StoryConfig {
    fn default() -> Self {
        Self {
            chapters: default_chapters(),
            context_passages: default_context_passages(),
        }
    }
}

impl StoryloomConfig {
    /// Load `explicit` if given, else `<data_dir>/storyloom.toml` if it exists,
    /// else defaults.
    pub fn load(data_dir: &Path, explicit: Option<&Path>) -> Result<Self> {
        let config = match explicit {
            Some(path) => Self::load_from(path)?,
            None => {
                let path = Self::config_path(data_dir);
                if path.exists() {
                    Self::load_from(&path)?
                } else {
                    Self::default()
                }
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn config_path(data_dir: &Path) -> PathBuf {
        data_dir.join(CONFIG_FILE_NAME)
    }

    /// Platform data directory, e.g. `~/.local/share/storyloom`
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("storyloom")
    }

    pub fn validate(&self) -> Result<()> {
        self.chunking
            .chunker_config()
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("chunking: {}", e)))?;

        if self.ollama.embedding_dim == 0 {
            return Err(ConfigError::Invalid(
                "ollama.embedding_dim must be greater than zero".to_string(),
            ));
        }
        if self.story.chapters == 0 {
            return Err(ConfigError::Invalid(
                "story.chapters must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
