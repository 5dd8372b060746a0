//! Index store: journal chunks in SQLite, vectors in a sqlite-vec `vec0` table.
//!
//! Rows live in `chunks`; only embedded rows have a twin in `chunks_vec`, so
//! companion full entries are never similarity candidates.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Transaction};

use super::types::{Candidate, Chunk, ChunkType, EntryMetadata, IndexRecord, RecordFilter};
use crate::embedding::EMBEDDING_DIM;

/// Largest `k` a sqlite-vec KNN query accepts.
pub const MAX_KNN: usize = 4096;

/// Persistent storage for indexed records.
///
/// All methods are synchronous; async callers should use
/// `tokio::task::spawn_blocking`.
pub trait IndexStore: Send + Sync {
    /// Store `records`. Existing records of every source in the batch are
    /// replaced, in one transaction.
    fn upsert(&self, records: &[IndexRecord]) -> Result<()>;

    /// Up to `limit` embedded records nearest to `embedding`, nearest first.
    /// Fewer than `limit` only when the store holds fewer embedded records.
    fn query(&self, embedding: &[f32], limit: usize) -> Result<Vec<Candidate>>;

    /// Records matching `filter`, ordered by source then chunk index.
    fn get(&self, filter: &RecordFilter) -> Result<Vec<Chunk>>;

    /// Number of records a similarity query can return.
    fn count(&self) -> Result<usize>;

    /// Distinct sources with at least one stored record.
    fn sources(&self) -> Result<Vec<String>>;

    /// Delete every record of `sources`. Returns the number of rows removed.
    fn remove_sources(&self, sources: &[String]) -> Result<usize>;
}

/// Convert an f32 embedding to the little-endian blob sqlite-vec expects.
pub fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub struct SqliteIndexStore {
    conn: Mutex<Connection>,
    dimensions: usize,
}

impl SqliteIndexStore {
    /// Wrap a connection whose schema is already initialized.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            dimensions: EMBEDDING_DIM,
        }
    }

    /// Open (or create) the index file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(crate::db::open_database(path)?))
    }

    /// A throwaway in-memory index.
    pub fn in_memory() -> Result<Self> {
        Ok(Self::new(crate::db::open_memory_database()?))
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Run `f` with the underlying connection (schema metadata, diagnostics).
    pub fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.lock()?;
        f(&conn)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| anyhow::anyhow!("index lock poisoned: {e}"))
    }
}

impl IndexStore for SqliteIndexStore {
    fn upsert(&self, records: &[IndexRecord]) -> Result<()> {
        for record in records {
            if let Some(embedding) = &record.embedding {
                anyhow::ensure!(
                    embedding.len() == self.dimensions,
                    "embedding for {} has {} dimensions, index expects {}",
                    record.chunk.id,
                    embedding.len(),
                    self.dimensions
                );
            }
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let sources: BTreeSet<&str> = records.iter().map(|r| r.chunk.source.as_str()).collect();
        for source in &sources {
            delete_source(&tx, source)?;
        }

        let indexed_at = chrono::Utc::now().to_rfc3339();
        for record in records {
            insert_record(&tx, record, &indexed_at)
                .with_context(|| format!("failed to insert {}", record.chunk.id))?;
        }

        tx.commit()?;
        tracing::debug!(records = records.len(), sources = sources.len(), "upsert committed");
        Ok(())
    }

    fn query(&self, embedding: &[f32], limit: usize) -> Result<Vec<Candidate>> {
        anyhow::ensure!(
            embedding.len() == self.dimensions,
            "query embedding has {} dimensions, index expects {}",
            embedding.len(),
            self.dimensions
        );
        if limit == 0 {
            return Ok(Vec::new());
        }

        let conn = self.lock()?;
        // vec0 KNN caps k; wider pages fall back to a brute-force scan.
        let sql = if limit <= MAX_KNN {
            "SELECT id, distance FROM chunks_vec \
             WHERE embedding MATCH ?1 ORDER BY distance LIMIT ?2"
        } else {
            "SELECT id, vec_distance_l2(embedding, ?1) AS distance FROM chunks_vec \
             ORDER BY distance LIMIT ?2"
        };
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = conn.prepare(sql)?;
        let neighbours = stmt
            .query_map(params![embedding_to_bytes(embedding), limit], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut candidates = Vec::with_capacity(neighbours.len());
        for (id, distance) in neighbours {
            match load_chunk(&conn, &id)? {
                Some(chunk) => candidates.push(Candidate { chunk, distance }),
                None => tracing::warn!(id = %id, "vector without chunk row, ignoring"),
            }
        }
        Ok(candidates)
    }

    fn get(&self, filter: &RecordFilter) -> Result<Vec<Chunk>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, source, chunk_index, chunk_type, content, metadata FROM chunks \
             WHERE (?1 IS NULL OR source = ?1) AND (?2 IS NULL OR chunk_type = ?2) \
             ORDER BY source, chunk_index",
        )?;
        let rows = stmt
            .query_map(
                params![filter.source, filter.chunk_type.map(|t| t.as_str())],
                ChunkRow::from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(ChunkRow::into_chunk).collect()
    }

    fn count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM chunks_vec", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn sources(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT DISTINCT source FROM chunks ORDER BY source")?;
        let sources = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(sources)
    }

    fn remove_sources(&self, sources: &[String]) -> Result<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut removed = 0;
        for source in sources {
            removed += delete_source(&tx, source)?;
        }
        tx.commit()?;
        tracing::info!(sources = sources.len(), removed, "removed sources from index");
        Ok(removed)
    }
}

/// Remove every row (and vector) of `source`. Returns the number of chunk rows removed.
fn delete_source(tx: &Transaction<'_>, source: &str) -> Result<usize> {
    let mut stmt = tx.prepare("SELECT id FROM chunks WHERE source = ?1")?;
    let ids = stmt
        .query_map([source], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    for id in &ids {
        tx.execute("DELETE FROM chunks_vec WHERE id = ?1", [id])?;
    }
    let removed = tx.execute("DELETE FROM chunks WHERE source = ?1", [source])?;
    Ok(removed)
}

fn insert_record(tx: &Transaction<'_>, record: &IndexRecord, indexed_at: &str) -> Result<()> {
    let chunk = &record.chunk;
    let metadata = serde_json::to_string(&chunk.metadata)?;
    tx.execute(
        "INSERT INTO chunks (id, source, chunk_index, chunk_type, content, metadata, indexed_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            chunk.id,
            chunk.source,
            chunk.chunk_index.map(|i| i as i64),
            chunk.chunk_type.as_str(),
            chunk.text,
            metadata,
            indexed_at,
        ],
    )?;
    if let Some(embedding) = &record.embedding {
        tx.execute(
            "INSERT INTO chunks_vec (id, embedding) VALUES (?1, ?2)",
            params![chunk.id, embedding_to_bytes(embedding)],
        )?;
    }
    Ok(())
}

fn load_chunk(conn: &Connection, id: &str) -> Result<Option<Chunk>> {
    conn.query_row(
        "SELECT id, source, chunk_index, chunk_type, content, metadata FROM chunks WHERE id = ?1",
        [id],
        ChunkRow::from_row,
    )
    .optional()?
    .map(ChunkRow::into_chunk)
    .transpose()
}

/// Raw column values; decoded outside the rusqlite row callback.
struct ChunkRow {
    id: String,
    source: String,
    chunk_index: Option<i64>,
    chunk_type: String,
    content: String,
    metadata: String,
}

impl ChunkRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            source: row.get(1)?,
            chunk_index: row.get(2)?,
            chunk_type: row.get(3)?,
            content: row.get(4)?,
            metadata: row.get(5)?,
        })
    }

    fn into_chunk(self) -> Result<Chunk> {
        let chunk_type: ChunkType = self.chunk_type.parse().map_err(anyhow::Error::msg)?;
        let metadata: EntryMetadata = serde_json::from_str(&self.metadata)
            .with_context(|| format!("corrupt metadata for {}", self.id))?;
        Ok(Chunk {
            id: self.id,
            source: self.source,
            chunk_index: self.chunk_index.map(|i| i as usize),
            chunk_type,
            text: self.content,
            metadata,
        })
    }
}
