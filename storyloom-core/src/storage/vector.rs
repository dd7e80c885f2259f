//! DuckDB-backed vector store
//!
//! Each embedding component is a `DOUBLE` column (`e0..e{D-1}`), and the
//! schema, insert statement and cosine score expression are generated for D
//! when the store is opened. Every operation opens its own connection.

use super::{EmbeddingRow, FileSummary, Result, SearchHit, StorageError, VectorStorage};
use duckdb::{params, params_from_iter, Connection, ToSql};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Added to the norm product so zero vectors score 0 instead of NaN
const SCORE_EPSILON: &str = "1e-8";

/// DuckDB vector store with one column per embedding component
#[derive(Debug, Clone)]
pub struct VectorStore {
    path: PathBuf,
    dimension: usize,
    vector_columns: String,
    insert_sql: String,
    score_expr: String,
}

impl VectorStore {
    /// Open or create a store at the given path with embedding dimension `dimension`
    pub fn open(path: &Path, dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(StorageError::InvalidDimension);
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let columns: Vec<String> = (0..dimension).map(|i| format!("e{}", i)).collect();

        let store = Self {
            path: path.to_path_buf(),
            dimension,
            vector_columns: columns.join(", "),
            insert_sql: format!(
                "INSERT OR REPLACE INTO embeddings (id, file_path, chunk_index, chunk_text, hash, {}) VALUES (?, ?, ?, ?, ?, {})",
                columns.join(", "),
                vec!["?"; dimension].join(", ")
            ),
            score_expr: format!(
                "({}) / (CAST(? AS DOUBLE) * sqrt({}) + {})",
                columns
                    .iter()
                    .map(|c| format!("{} * CAST(? AS DOUBLE)", c))
                    .collect::<Vec<_>>()
                    .join(" + "),
                columns
                    .iter()
                    .map(|c| format!("{c} * {c}"))
                    .collect::<Vec<_>>()
                    .join(" + "),
                SCORE_EPSILON
            ),
        };

        store.migrate(&columns)?;
        debug!(path = %path.display(), dimension, "Opened vector store");
        Ok(store)
    }

    /// Create the table if absent and check the stored dimension
    fn migrate(&self, columns: &[String]) -> Result<()> {
        let conn = self.connect()?;

        let vector_defs = columns
            .iter()
            .map(|c| format!("{} DOUBLE NOT NULL", c))
            .collect::<Vec<_>>()
            .join(",\n                ");

        conn.execute_batch(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS embeddings (
                id VARCHAR PRIMARY KEY,
                file_path VARCHAR NOT NULL,
                chunk_index BIGINT NOT NULL,
                chunk_text VARCHAR NOT NULL,
                hash VARCHAR NOT NULL,
                {}
            );
            "#,
            vector_defs
        ))?;

        let actual: i64 = conn.query_row(
            r#"
            SELECT COUNT(*)
            FROM information_schema.columns
            WHERE table_name = 'embeddings'
              AND regexp_matches(column_name, '^e[0-9]+$')
            "#,
            [],
            |row| row.get(0),
        )?;

        let actual = actual as usize;
        if actual != self.dimension {
            return Err(StorageError::DimensionMismatch {
                expected: self.dimension,
                actual,
            });
        }

        Ok(())
    }

    fn connect(&self) -> Result<Connection> {
        Ok(Connection::open(&self.path)?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn validate_vector(&self, what: &str, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(StorageError::InvalidVector(format!(
                "{} has length {}, expected {}",
                what,
                vector.len(),
                self.dimension
            )));
        }
        if let Some(pos) = vector.iter().position(|v| !v.is_finite()) {
            return Err(StorageError::InvalidVector(format!(
                "{} component {} is not finite",
                what, pos
            )));
        }
        Ok(())
    }

    fn read_vector(&self, row: &duckdb::Row<'_>, offset: usize) -> duckdb::Result<Vec<f32>> {
        (0..self.dimension)
            .map(|i| row.get::<_, f64>(offset + i).map(|v| v as f32))
            .collect()
    }
}

impl VectorStorage for VectorStore {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn insert_or_replace(&self, row: &EmbeddingRow) -> Result<()> {
        self.validate_vector("vector", &row.vector)?;

        let chunk_index = row.chunk_index as i64;
        let components: Vec<f64> = row.vector.iter().map(|&v| v as f64).collect();

        let mut values: Vec<&dyn ToSql> = vec![
            &row.id,
            &row.file_path,
            &chunk_index,
            &row.chunk_text,
            &row.hash,
        ];
        values.extend(components.iter().map(|c| c as &dyn ToSql));

        let conn = self.connect()?;
        conn.execute(&self.insert_sql, values.as_slice())?;
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<()> {
        let conn = self.connect()?;
        conn.execute("DELETE FROM embeddings WHERE id = ?", params![id])?;
        Ok(())
    }

    fn delete_from_index(&self, file_path: &str, from_index: usize) -> Result<usize> {
        let conn = self.connect()?;
        let deleted = conn.execute(
            "DELETE FROM embeddings WHERE file_path = ? AND chunk_index >= ?",
            params![file_path, from_index as i64],
        )?;
        Ok(deleted)
    }

    fn get_by_id(&self, id: &str) -> Result<Vec<f32>> {
        let conn = self.connect()?;
        let result = conn.query_row(
            &format!(
                "SELECT {} FROM embeddings WHERE id = ?",
                self.vector_columns
            ),
            params![id],
            |row| self.read_vector(row, 0),
        );

        match result {
            Ok(vector) => Ok(vector),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(vec![0.0; self.dimension]),
            Err(e) => Err(e.into()),
        }
    }

    fn get_hash(&self, id: &str) -> Result<Option<String>> {
        let conn = self.connect()?;
        let result = conn.query_row(
            "SELECT hash FROM embeddings WHERE id = ?",
            params![id],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(hash) => Ok(Some(hash)),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn search_by_file(&self, file_path: &str) -> Result<Vec<EmbeddingRow>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT id, file_path, chunk_index, chunk_text, hash, {}
            FROM embeddings
            WHERE file_path = ?
            ORDER BY chunk_index ASC
            "#,
            self.vector_columns
        ))?;

        let rows = stmt
            .query_map(params![file_path], |row| {
                Ok(EmbeddingRow {
                    id: row.get(0)?,
                    file_path: row.get(1)?,
                    chunk_index: row.get::<_, i64>(2)? as usize,
                    chunk_text: row.get(3)?,
                    hash: row.get(4)?,
                    vector: self.read_vector(row, 5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchHit>> {
        self.validate_vector("query", query)?;
        if top_k == 0 {
            return Ok(vec![]);
        }

        let query_norm = query
            .iter()
            .map(|&v| (v as f64) * (v as f64))
            .sum::<f64>()
            .sqrt();

        let values: Vec<f64> = query
            .iter()
            .map(|&v| v as f64)
            .chain(std::iter::once(query_norm))
            .collect();

        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT id, file_path, chunk_index, chunk_text, hash, {} AS score
            FROM embeddings
            ORDER BY score DESC, id ASC
            LIMIT {}
            "#,
            self.score_expr,
            top_k.min(i64::MAX as usize)
        ))?;

        let hits = stmt
            .query_map(params_from_iter(values), |row| {
                Ok(SearchHit {
                    id: row.get(0)?,
                    file_path: row.get(1)?,
                    chunk_index: row.get::<_, i64>(2)? as usize,
                    chunk_text: row.get(3)?,
                    hash: row.get(4)?,
                    score: row.get(5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(hits)
    }

    fn count(&self) -> Result<usize> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM embeddings", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn list_files(&self) -> Result<Vec<FileSummary>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT file_path, COUNT(*)
            FROM embeddings
            GROUP BY file_path
            ORDER BY file_path
            "#,
        )?;

        let files = stmt
            .query_map([], |row| {
                Ok(FileSummary {
                    file_path: row.get(0)?,
                    chunks: row.get::<_, i64>(1)? as usize,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(files)
    }
}
