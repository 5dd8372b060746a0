#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use anyhow::Result;
use journal_mcp::config::JournalConfig;
use journal_mcp::embedding::{EmbeddingProvider, EMBEDDING_DIM};
use journal_mcp::journal::store::{IndexStore, SqliteIndexStore};
use journal_mcp::journal::types::{Candidate, Chunk, IndexRecord, RecordFilter};
use journal_mcp::journal::JournalContext;
use tempfile::TempDir;

/// Deterministic bag-of-words embedding: each lowercase word is hashed into
/// one of 384 buckets, then the vector is L2-normalized. Texts sharing words
/// land close together.
#[derive(Default)]
pub struct KeywordEmbedding {
    pub calls: AtomicUsize,
}

pub fn keyword_vector(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; EMBEDDING_DIM];
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let mut hash: u64 = 0xcbf29ce484222325;
        for byte in word.to_lowercase().bytes() {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(0x100000001b3);
        }
        v[(hash % EMBEDDING_DIM as u64) as usize] += 1.0;
    }
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    } else {
        v[0] = 1.0;
    }
    v
}

impl EmbeddingProvider for KeywordEmbedding {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(keyword_vector(text))
    }
}

/// Provider whose model is "unavailable".
pub struct FailingEmbedding;

impl EmbeddingProvider for FailingEmbedding {
    fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        anyhow::bail!("embedding model unavailable")
    }
}

/// Wraps a real in-memory store, counting calls and failing on demand.
pub struct ProbeStore {
    pub inner: SqliteIndexStore,
    pub fail_upsert: AtomicBool,
    pub fail_query: AtomicBool,
    pub fail_get: AtomicBool,
    pub upserts: AtomicUsize,
    pub queries: AtomicUsize,
    /// `limit` argument of every `query` call, in order.
    pub query_limits: std::sync::Mutex<Vec<usize>>,
}

impl ProbeStore {
    pub fn new() -> Self {
        Self {
            inner: SqliteIndexStore::in_memory().unwrap(),
            fail_upsert: AtomicBool::new(false),
            fail_query: AtomicBool::new(false),
            fail_get: AtomicBool::new(false),
            upserts: AtomicUsize::new(0),
            queries: AtomicUsize::new(0),
            query_limits: std::sync::Mutex::new(Vec::new()),
        }
    }
}

impl IndexStore for ProbeStore {
    fn upsert(&self, records: &[IndexRecord]) -> Result<()> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        if self.fail_upsert.load(Ordering::SeqCst) {
            anyhow::bail!("vector store unavailable");
        }
        self.inner.upsert(records)
    }

    fn query(&self, embedding: &[f32], limit: usize) -> Result<Vec<Candidate>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.query_limits.lock().unwrap().push(limit);
        if self.fail_query.load(Ordering::SeqCst) {
            anyhow::bail!("vector store unavailable");
        }
        self.inner.query(embedding, limit)
    }

    fn get(&self, filter: &RecordFilter) -> Result<Vec<Chunk>> {
        if self.fail_get.load(Ordering::SeqCst) {
            anyhow::bail!("lookup failed");
        }
        self.inner.get(filter)
    }

    fn count(&self) -> Result<usize> {
        self.inner.count()
    }

    fn sources(&self) -> Result<Vec<String>> {
        self.inner.sources()
    }

    fn remove_sources(&self, sources: &[String]) -> Result<usize> {
        self.inner.remove_sources(sources)
    }
}

/// A journal directory and state directory under one temp dir.
pub struct TestJournal {
    pub tmp: TempDir,
}

impl TestJournal {
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("journal")).unwrap();
        Self { tmp }
    }

    pub fn root(&self) -> PathBuf {
        self.tmp.path().join("journal")
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root().join(name)
    }

    /// Write an entry, creating parent directories.
    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    /// Write an entry with a `date` frontmatter field.
    pub fn write_entry(&self, name: &str, date: &str, body: &str) -> PathBuf {
        self.write(name, &format!("---\ndate: {date}\n---\n{body}\n"))
    }

    pub fn config(&self) -> JournalConfig {
        let mut config = JournalConfig::default();
        let state = self.tmp.path().join("state");
        config.journal.root = self.root().to_string_lossy().into_owned();
        config.storage.db_path = state.join("index.db").to_string_lossy().into_owned();
        config.storage.watermark_path = state
            .join("last_indexed_time.txt")
            .to_string_lossy()
            .into_owned();
        config
    }

    pub fn context(
        &self,
        store: Arc<dyn IndexStore>,
        embedding: Arc<dyn EmbeddingProvider>,
    ) -> JournalContext {
        JournalContext::new(Arc::new(self.config()), store, embedding)
    }
}

/// Set a file's modification time to `offset_secs` from now.
pub fn set_mtime(path: &Path, offset_secs: i64) {
    let now = SystemTime::now();
    let when = if offset_secs >= 0 {
        now + Duration::from_secs(offset_secs as u64)
    } else {
        now - Duration::from_secs(offset_secs.unsigned_abs())
    };
    let file = std::fs::OpenOptions::new().write(true).open(path).unwrap();
    file.set_modified(when).unwrap();
}

/// `len` characters of `words` repeated, never starting or ending in whitespace.
pub fn body_of(words: &[&str], len: usize) -> String {
    let mut text = String::new();
    while text.chars().count() < len {
        for word in words {
            text.push_str(word);
            text.push(' ');
        }
    }
    let mut out: String = text.chars().take(len).collect();
    if out.ends_with(' ') {
        out.pop();
        out.push('.');
    }
    out
}
