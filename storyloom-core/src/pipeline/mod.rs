//! Ingest pipeline: read → normalize → chunk → embed → store
//!
//! Files are processed one at a time and chunks are embedded sequentially.
//! A chunk that fails to embed or validate is logged and skipped; storage
//! failures abort the run.

pub mod config;

pub use config::IngestConfig;

use crate::embeddings::{normalize, ChunkerError, Embedder, TextChunker};
use crate::storage::{EmbeddingRow, StorageError, VectorStorage};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Chunker error: {0}")]
    Chunker(#[from] ChunkerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Source directory not found: {0}")]
    SourceNotFound(PathBuf),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Result of an ingest run
#[derive(Debug, Default, Clone, PartialEq)]
pub struct IngestReport {
    pub files_processed: usize,
    pub files_failed: usize,
    pub chunks_total: usize,
    pub chunks_stored: usize,
    pub chunks_unchanged: usize,
    pub chunks_failed: usize,
    pub stale_removed: usize,
    pub errors: Vec<String>,
}

/// Ingests a directory of documents into a vector store
pub struct IngestPipeline<'a> {
    config: IngestConfig,
    chunker: TextChunker,
    embedder: &'a dyn Embedder,
    store: &'a dyn VectorStorage,
}

impl<'a> IngestPipeline<'a> {
    pub fn new(
        config: IngestConfig,
        embedder: &'a dyn Embedder,
        store: &'a dyn VectorStorage,
    ) -> Result<Self> {
        let chunker = TextChunker::new(config.chunker)?;
        Ok(Self {
            config,
            chunker,
            embedder,
            store,
        })
    }

    /// Matching files directly inside `source_dir`, in lexicographic order
    pub fn source_files(&self, source_dir: &Path) -> Result<Vec<PathBuf>> {
        if !source_dir.is_dir() {
            return Err(PipelineError::SourceNotFound(source_dir.to_path_buf()));
        }

        let mut files = Vec::new();
        for entry in std::fs::read_dir(source_dir)? {
            let path = entry?.path();
            if path.is_file() && self.config.matches(&path) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Run the pipeline over every matching file in `source_dir`
    pub async fn run(&self, source_dir: &Path) -> Result<IngestReport> {
        let mut report = IngestReport::default();
        let files = self.source_files(source_dir)?;
        info!(dir = %source_dir.display(), files = files.len(), "Starting ingest");

        // chunk ids are keyed by stem, so `book.txt` and `book.md` would collide
        let mut stems = HashSet::new();

        for path in files {
            let stem = id_stem(&path);
            if !stems.insert(stem.clone()) {
                warn!(file = %path.display(), stem = %stem, "Skipping file with duplicate stem");
                report.files_failed += 1;
                report
                    .errors
                    .push(format!("{}: duplicate stem '{}'", path.display(), stem));
                continue;
            }

            let raw = match std::fs::read_to_string(&path) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "Failed to read file");
                    report.files_failed += 1;
                    report.errors.push(format!("{}: {}", path.display(), e));
                    continue;
                }
            };

            self.ingest_file(&path, &stem, &raw, &mut report).await?;
            report.files_processed += 1;
        }

        info!(
            files = report.files_processed,
            stored = report.chunks_stored,
            unchanged = report.chunks_unchanged,
            failed = report.chunks_failed,
            "Ingest complete"
        );
        Ok(report)
    }

    async fn ingest_file(
        &self,
        path: &Path,
        stem: &str,
        raw: &str,
        report: &mut IngestReport,
    ) -> Result<()> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let text = normalize(raw, self.config.strip_boilerplate);
        let mut chunk_count = 0;

        for record in self.chunker.chunk_document(&file_name, &text) {
            chunk_count += 1;
            report.chunks_total += 1;

            let id = format!("{}_{}", stem, record.index);

            if self.store.get_hash(&id)?.as_deref() == Some(record.content_hash.as_str()) {
                debug!(id = %id, "Chunk unchanged");
                report.chunks_unchanged += 1;
                continue;
            }

            let vector = match self.embedder.embed(&record.text).await {
                Ok(vector) => vector,
                Err(e) => {
                    warn!(id = %id, error = %e, "Failed to embed chunk");
                    report.chunks_failed += 1;
                    report.errors.push(format!("{}: {}", id, e));
                    continue;
                }
            };

            let row = EmbeddingRow {
                id,
                file_path: file_name.clone(),
                chunk_index: record.index,
                chunk_text: record.text,
                hash: record.content_hash,
                vector,
            };

            match self.store.insert_or_replace(&row) {
                Ok(()) => {
                    debug!(id = %row.id, "Stored chunk");
                    report.chunks_stored += 1;
                }
                Err(e) if e.is_validation() => {
                    warn!(id = %row.id, error = %e, "Rejected chunk");
                    report.chunks_failed += 1;
                    report.errors.push(format!("{}: {}", row.id, e));
                }
                Err(e) => return Err(e.into()),
            }
        }

        let stale = self.store.delete_from_index(&file_name, chunk_count)?;
        if stale > 0 {
            debug!(file = %file_name, stale, "Removed stale chunks");
        }
        report.stale_removed += stale;

        info!(file = %file_name, chunks = chunk_count, "Ingested file");
        Ok(())
    }
}

/// Prefix of the chunk ids written for `path`
fn id_stem(path: &Path) -> String {
    path.file_stem()
        .or_else(|| path.file_name())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::model::MockEmbedder;
    use crate::embeddings::{ChunkerConfig, EmbeddingError, MockEmbeddingModel};
    use crate::storage::VectorStore;
    use tempfile::{tempdir, TempDir};

    const DIM: usize = 8;

    fn small_config() -> IngestConfig {
        IngestConfig::new(ChunkerConfig::chars(60, 10))
    }

    fn setup() -> (TempDir, TempDir, VectorStore) {
        let source = tempdir().unwrap();
        let data = tempdir().unwrap();
        let store = VectorStore::open(&data.path().join("store.duckdb"), DIM).unwrap();
        (source, data, store)
    }

    fn write(dir: &TempDir, name: &str, content: &str) {
        std::fs::write(dir.path().join(name), content).unwrap();
    }

    const STORY: &str = "The lighthouse keeper woke before dawn.\n\n\
        He climbed the spiral stairs and lit the lamp.\n\n\
        Ships passed safely through the fog that night.";

    #[tokio::test]
    async fn test_ingest_stores_gapless_chunks() {
        let (source, _data, store) = setup();
        write(&source, "keeper.txt", STORY);
        write(&source, "short.txt", "A tiny tale.");

        let embedder = MockEmbeddingModel::new(DIM);
        let pipeline = IngestPipeline::new(small_config(), &embedder, &store).unwrap();
        let report = pipeline.run(source.path()).await.unwrap();

        assert_eq!(report.files_processed, 2);
        assert_eq!(report.chunks_failed, 0);
        assert_eq!(report.chunks_stored, report.chunks_total);
        assert!(report.errors.is_empty());

        let rows = store.search_by_file("keeper.txt").unwrap();
        assert!(rows.len() >= 3);
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row.chunk_index, i);
            assert_eq!(row.id, format!("keeper_{}", i));
            assert_eq!(row.hash, crate::embeddings::content_hash(&row.chunk_text));
            assert!(row.chunk_text.chars().count() <= 60);
        }

        let short = store.search_by_file("short.txt").unwrap();
        assert_eq!(short.len(), 1);
        assert_eq!(short[0].chunk_text, "A tiny tale.");
        assert_eq!(short[0].vector, embedder.vector_for("A tiny tale."));
    }

    #[tokio::test]
    async fn test_rerun_skips_unchanged_chunks() {
        let (source, _data, store) = setup();
        write(&source, "keeper.txt", STORY);

        let embedder = MockEmbeddingModel::new(DIM);
        let first = IngestPipeline::new(small_config(), &embedder, &store)
            .unwrap()
            .run(source.path())
            .await
            .unwrap();

        let mut mock = MockEmbedder::new();
        mock.expect_embed().never();

        let second = IngestPipeline::new(small_config(), &mock, &store)
            .unwrap()
            .run(source.path())
            .await
            .unwrap();

        assert_eq!(second.chunks_unchanged, first.chunks_total);
        assert_eq!(second.chunks_stored, 0);
        assert_eq!(store.count().unwrap(), first.chunks_total);
    }

    #[tokio::test]
    async fn test_embed_failure_skips_chunk_and_continues() {
        let (source, _data, store) = setup();
        write(
            &source,
            "mixed.txt",
            "First good paragraph.\n\nPoison paragraph here.\n\nLast good paragraph.",
        );

        let mut mock = MockEmbedder::new();
        mock.expect_embed().returning(|text| {
            if text.contains("Poison") {
                Err(EmbeddingError::Model("model crashed".to_string()))
            } else {
                Ok(vec![0.5; DIM])
            }
        });

        let config = IngestConfig::new(ChunkerConfig::chars(25, 0));
        let pipeline = IngestPipeline::new(config, &mock, &store).unwrap();
        let report = pipeline.run(source.path()).await.unwrap();

        assert_eq!(report.chunks_total, 3);
        assert_eq!(report.chunks_stored, 2);
        assert_eq!(report.chunks_failed, 1);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("mixed_1"));

        let ids: Vec<String> = store
            .search_by_file("mixed.txt")
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["mixed_0".to_string(), "mixed_2".to_string()]);
    }

    #[tokio::test]
    async fn test_wrong_dimension_is_rejected_not_fatal() {
        let (source, _data, store) = setup();
        write(&source, "a.txt", "Alpha.");
        write(&source, "b.txt", "Beta.");

        let mut mock = MockEmbedder::new();
        mock.expect_embed().returning(|text| {
            if text.starts_with("Alpha") {
                Ok(vec![1.0; DIM - 1])
            } else {
                Ok(vec![1.0; DIM])
            }
        });

        let pipeline = IngestPipeline::new(small_config(), &mock, &store).unwrap();
        let report = pipeline.run(source.path()).await.unwrap();

        assert_eq!(report.files_processed, 2);
        assert_eq!(report.chunks_failed, 1);
        assert_eq!(report.chunks_stored, 1);
        assert_eq!(store.get_hash("a_0").unwrap(), None);
        assert!(store.get_hash("b_0").unwrap().is_some());
    }

    #[tokio::test]
    async fn test_shrunk_file_removes_stale_chunks() {
        let (source, _data, store) = setup();
        write(&source, "keeper.txt", STORY);

        let embedder = MockEmbeddingModel::new(DIM);
        let pipeline = IngestPipeline::new(small_config(), &embedder, &store).unwrap();
        let first = pipeline.run(source.path()).await.unwrap();
        assert!(first.chunks_total > 1);

        write(&source, "keeper.txt", "Only one line remains.");
        let second = pipeline.run(source.path()).await.unwrap();

        assert_eq!(second.chunks_total, 1);
        assert_eq!(second.stale_removed, first.chunks_total - 1);
        let rows = store.search_by_file("keeper.txt").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].chunk_text, "Only one line remains.");
    }

    #[tokio::test]
    async fn test_source_file_selection() {
        let (source, _data, store) = setup();
        write(&source, "b.txt", "B.");
        write(&source, "a.TXT", "A.");
        write(&source, "image.png", "not text");
        std::fs::create_dir(source.path().join("nested")).unwrap();
        write(&source, "nested/c.txt", "C.");

        let embedder = MockEmbeddingModel::new(DIM);
        let pipeline = IngestPipeline::new(small_config(), &embedder, &store).unwrap();

        let names: Vec<String> = pipeline
            .source_files(source.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.TXT".to_string(), "b.txt".to_string()]);
    }

    #[tokio::test]
    async fn test_duplicate_stem_is_skipped() {
        let (source, _data, store) = setup();
        write(&source, "book.md", "Markdown edition.");
        write(&source, "book.txt", "Plain text edition.");

        let embedder = MockEmbeddingModel::new(DIM);
        let config = small_config().with_extensions(["txt", "md"]);
        let pipeline = IngestPipeline::new(config, &embedder, &store).unwrap();
        let report = pipeline.run(source.path()).await.unwrap();

        assert_eq!(report.files_processed, 1);
        assert_eq!(report.files_failed, 1);
        assert_eq!(report.chunks_stored, 1);
        assert!(report.errors[0].contains("book.txt"));

        assert_eq!(store.count().unwrap(), 1);
        let rows = store.search_by_file("book.md").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].chunk_text, "Markdown edition.");
        assert!(store.search_by_file("book.txt").unwrap().is_empty());

        let rerun = pipeline.run(source.path()).await.unwrap();
        assert_eq!(rerun.chunks_unchanged, 1);
        assert_eq!(rerun.chunks_stored, 0);
    }

    #[tokio::test]
    async fn test_unreadable_file_is_recorded() {
        let (source, _data, store) = setup();
        std::fs::write(source.path().join("binary.txt"), [0xff, 0xfe, 0x00, 0x9f]).unwrap();
        write(&source, "ok.txt", "Fine text.");

        let embedder = MockEmbeddingModel::new(DIM);
        let pipeline = IngestPipeline::new(small_config(), &embedder, &store).unwrap();
        let report = pipeline.run(source.path()).await.unwrap();

        assert_eq!(report.files_failed, 1);
        assert_eq!(report.files_processed, 1);
        assert!(report.errors[0].contains("binary.txt"));
    }

    #[tokio::test]
    async fn test_missing_source_dir() {
        let (source, _data, store) = setup();
        let embedder = MockEmbeddingModel::new(DIM);
        let pipeline = IngestPipeline::new(small_config(), &embedder, &store).unwrap();

        let err = pipeline
            .run(&source.path().join("missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::SourceNotFound(_)));
    }

    #[test]
    fn test_invalid_chunker_config() {
        let (_source, _data, store) = setup();
        let embedder = MockEmbeddingModel::new(DIM);
        let result = IngestPipeline::new(
            IngestConfig::new(ChunkerConfig::chars(10, 10)),
            &embedder,
            &store,
        );
        assert!(matches!(result, Err(PipelineError::Chunker(_))));
    }
}
