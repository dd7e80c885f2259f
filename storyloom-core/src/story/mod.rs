//! Checkpointed story generation
//!
//! Runs premise → characters → outline → chapters → manuscript. Each phase is
//! saved as JSON in the work directory and loaded instead of regenerated on
//! the next run, so an interrupted run picks up where it stopped.

pub mod checkpoint;
pub mod ndjson;
pub mod prompts;

pub use checkpoint::CheckpointStore;
pub use ndjson::parse_ndjson;

use crate::embeddings::{EmbeddingError, Embedder};
use crate::ollama::OllamaError;
use crate::storage::{StorageError, VectorStorage};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

pub const MANUSCRIPT_FILE: &str = "manuscript.md";

#[derive(Error, Debug)]
pub enum StoryError {
    #[error("Ollama error: {0}")]
    Ollama(#[from] OllamaError),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Phase '{0}' produced no usable output")]
    EmptyPhase(String),
}

pub type Result<T> = std::result::Result<T, StoryError>;

/// Text generation backend for the workflow
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String>;
}

/// Source of reference passages for chapter prompts
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, query: &str, limit: usize) -> Result<Vec<String>>;
}

/// [`Retriever`] over the ingested vector store
pub struct VectorRetriever<'a> {
    embedder: &'a dyn Embedder,
    store: &'a dyn VectorStorage,
}

impl<'a> VectorRetriever<'a> {
    pub fn new(embedder: &'a dyn Embedder, store: &'a dyn VectorStorage) -> Self {
        Self { embedder, store }
    }
}

#[async_trait]
impl Retriever for VectorRetriever<'_> {
    async fn retrieve(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        let vector = self.embedder.embed(query).await?;
        let hits = self.store.search(&vector, limit)?;
        Ok(hits.into_iter().map(|h| h.chunk_text).collect())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Premise {
    pub title: Option<String>,
    pub text: String,
}

impl Premise {
    /// Split an optional leading `Title:` line from the premise body
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let (first, rest) = raw.split_once('\n').unwrap_or((raw, ""));
        let first = first.trim().trim_matches(|c| c == '*' || c == '#').trim();

        match first.get(..6) {
            Some(prefix) if prefix.eq_ignore_ascii_case("title:") => {
                let title = first[6..].trim().trim_matches('"').to_string();
                Self {
                    title: (!title.is_empty()).then_some(title),
                    text: rest.trim().to_string(),
                }
            }
            _ => Self {
                title: None,
                text: raw.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Character {
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutlineEntry {
    pub number: usize,
    pub title: String,
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chapter {
    pub number: usize,
    pub title: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoryOptions {
    pub chapters: usize,
    /// Passages retrieved per chapter when a retriever is attached
    pub context_passages: usize,
}

impl Default for StoryOptions {
    fn default() -> Self {
        Self {
            chapters: 5,
            context_passages: 3,
        }
    }
}

/// Summary of a finished run
#[derive(Debug, Clone, PartialEq)]
pub struct StoryOutcome {
    pub manuscript: PathBuf,
    pub title: String,
    pub chapters: usize,
    /// Phases (including individual chapters) loaded from checkpoints
    pub resumed: usize,
}

/// Drives the story phases against a generator and checkpoint directory
pub struct StoryWorkflow<'a> {
    generator: &'a dyn TextGenerator,
    retriever: Option<&'a dyn Retriever>,
    checkpoints: CheckpointStore,
    options: StoryOptions,
}

impl<'a> StoryWorkflow<'a> {
    pub fn new(
        generator: &'a dyn TextGenerator,
        work_dir: &Path,
        options: StoryOptions,
    ) -> Result<Self> {
        Ok(Self {
            generator,
            retriever: None,
            checkpoints: CheckpointStore::open(work_dir)?,
            options,
        })
    }

    pub fn with_retriever(mut self, retriever: &'a dyn Retriever) -> Self {
        self.retriever = Some(retriever);
        self
    }

    pub async fn run(&self, idea: &str) -> Result<StoryOutcome> {
        let mut resumed = 0;

        let premise = match self.checkpoints.load::<Premise>("premise")? {
            Some(p) => {
                resumed += 1;
                p
            }
            None => self.premise(idea).await?,
        };

        let characters = match self.checkpoints.load::<Vec<Character>>("characters")? {
            Some(c) if !c.is_empty() => {
                resumed += 1;
                c
            }
            _ => self.characters(&premise).await?,
        };

        let outline = match self.checkpoints.load::<Vec<OutlineEntry>>("outline")? {
            Some(o) if !o.is_empty() => {
                resumed += 1;
                o
            }
            _ => self.outline(&premise, &characters).await?,
        };

        let mut chapters = Vec::with_capacity(outline.len());
        for entry in &outline {
            let name = chapter_checkpoint(entry.number);
            let chapter = match self.checkpoints.load::<Chapter>(&name)? {
                Some(c) => {
                    resumed += 1;
                    c
                }
                None => self.chapter(&premise, &characters, &outline, entry).await?,
            };
            chapters.push(chapter);
        }

        let title = premise
            .title
            .clone()
            .unwrap_or_else(|| "Untitled".to_string());
        let manuscript = self.checkpoints.dir().join(MANUSCRIPT_FILE);
        std::fs::write(&manuscript, assemble_manuscript(&title, &chapters))?;
        info!(path = %manuscript.display(), chapters = chapters.len(), "Manuscript written");

        Ok(StoryOutcome {
            manuscript,
            title,
            chapters: chapters.len(),
            resumed,
        })
    }

    async fn premise(&self, idea: &str) -> Result<Premise> {
        info!("Generating premise");
        let raw = self
            .generator
            .generate(prompts::PREMISE_SYSTEM, &prompts::premise_prompt(idea))
            .await?;

        let premise = Premise::parse(&raw);
        if premise.text.is_empty() {
            return Err(StoryError::EmptyPhase("premise".to_string()));
        }
        self.checkpoints.save("premise", &premise)?;
        Ok(premise)
    }

    async fn characters(&self, premise: &Premise) -> Result<Vec<Character>> {
        info!("Generating characters");
        let raw = self
            .generator
            .generate(prompts::CHARACTERS_SYSTEM, &prompts::characters_prompt(premise))
            .await?;

        let characters: Vec<Character> = parse_ndjson(&raw);
        if characters.is_empty() {
            return Err(StoryError::EmptyPhase("characters".to_string()));
        }
        self.checkpoints.save("characters", &characters)?;
        Ok(characters)
    }

    async fn outline(
        &self,
        premise: &Premise,
        characters: &[Character],
    ) -> Result<Vec<OutlineEntry>> {
        info!(chapters = self.options.chapters, "Generating outline");
        let raw = self
            .generator
            .generate(
                prompts::OUTLINE_SYSTEM,
                &prompts::outline_prompt(premise, characters, self.options.chapters),
            )
            .await?;

        let mut outline: Vec<OutlineEntry> = parse_ndjson(&raw);
        if outline.is_empty() {
            return Err(StoryError::EmptyPhase("outline".to_string()));
        }
        if outline.len() < self.options.chapters {
            warn!(
                requested = self.options.chapters,
                received = outline.len(),
                "Outline is shorter than requested"
            );
        }
        outline.truncate(self.options.chapters);
        for (i, entry) in outline.iter_mut().enumerate() {
            entry.number = i + 1;
        }

        self.checkpoints.save("outline", &outline)?;
        Ok(outline)
    }

    async fn chapter(
        &self,
        premise: &Premise,
        characters: &[Character],
        outline: &[OutlineEntry],
        entry: &OutlineEntry,
    ) -> Result<Chapter> {
        info!(chapter = entry.number, title = %entry.title, "Writing chapter");

        let passages = self.reference_passages(entry).await;
        let raw = self
            .generator
            .generate(
                prompts::CHAPTER_SYSTEM,
                &prompts::chapter_prompt(premise, characters, outline, entry, &passages),
            )
            .await?;

        let text = raw.trim();
        if text.is_empty() {
            return Err(StoryError::EmptyPhase(format!("chapter {}", entry.number)));
        }

        let chapter = Chapter {
            number: entry.number,
            title: entry.title.clone(),
            text: text.to_string(),
        };
        self.checkpoints
            .save(&chapter_checkpoint(entry.number), &chapter)?;
        Ok(chapter)
    }

    /// Retrieval failures only cost the chapter its references
    async fn reference_passages(&self, entry: &OutlineEntry) -> Vec<String> {
        let Some(retriever) = self.retriever else {
            return vec![];
        };
        if self.options.context_passages == 0 {
            return vec![];
        }

        let query = format!("{} {}", entry.title, entry.summary);
        match retriever
            .retrieve(&query, self.options.context_passages)
            .await
        {
            Ok(passages) => passages,
            Err(e) => {
                warn!(chapter = entry.number, error = %e, "Retrieval failed");
                vec![]
            }
        }
    }
}

fn chapter_checkpoint(number: usize) -> String {
    format!("chapter_{:02}", number)
}

/// Render chapters as a single markdown document
pub fn assemble_manuscript(title: &str, chapters: &[Chapter]) -> String {
    let mut out = format!("# {}\n", title);
    for chapter in chapters {
        out.push_str(&format!(
            "\n## Chapter {}: {}\n\n{}\n",
            chapter.number, chapter.title, chapter.text
        ));
    }
    out
}
