//! Semantic search over the journal: discovery, chunking, indexing and retrieval.
//!
//! [`JournalContext`] owns the store, the embedding provider and the watermark.
//! It is built once at startup and shared by the indexer and the retriever.

pub mod chunker;
pub mod frontmatter;
pub mod indexer;
pub mod retriever;
pub mod scan;
pub mod store;
pub mod types;
pub mod watermark;

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::config::JournalConfig;
use crate::db::migrations;
use crate::embedding::{self, EmbeddingProvider};
use crate::error::JournalError;
use indexer::IndexReport;
use retriever::SearchHit;
use store::{IndexStore, SqliteIndexStore};
use watermark::Watermark;

/// Everything an indexing run or a query needs.
pub struct JournalContext {
    pub config: Arc<JournalConfig>,
    pub store: Arc<dyn IndexStore>,
    pub embedding: Arc<dyn EmbeddingProvider>,
    pub watermark: Watermark,
    run_lock: Mutex<()>,
}

impl JournalContext {
    pub fn new(
        config: Arc<JournalConfig>,
        store: Arc<dyn IndexStore>,
        embedding: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        let watermark = Watermark::new(config.resolved_watermark_path());
        Self {
            config,
            store,
            embedding,
            watermark,
            run_lock: Mutex::new(()),
        }
    }

    /// Open the on-disk index and load the embedding model.
    ///
    /// Fails if either cannot be initialized; there is no degraded mode.
    pub fn open(config: JournalConfig) -> Result<Self> {
        let db_path = config.resolved_db_path();
        let store = SqliteIndexStore::open(&db_path)
            .with_context(|| format!("failed to open index at {}", db_path.display()))?;
        store.with_connection(|conn| record_index_identity(conn, &config))?;
        tracing::info!(db = %db_path.display(), "index store ready");

        let provider = embedding::create_provider(&config.embedding)
            .context("failed to initialize embedding model")?;
        anyhow::ensure!(
            provider.dimensions() == store.dimensions(),
            "embedding model produces {} dimensions, index expects {}",
            provider.dimensions(),
            store.dimensions()
        );
        tracing::info!(model = %config.embedding.model, "embedding provider ready");

        Ok(Self::new(Arc::new(config), Arc::new(store), Arc::from(provider)))
    }

    /// Index new or modified entries (or all of them when `full`).
    pub fn index(&self, full: bool) -> IndexReport {
        indexer::run(self, full)
    }

    /// Up to `k` results, one per source, nearest first.
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>, JournalError> {
        retriever::search(self, query, k)
    }

    pub(crate) fn run_lock(&self) -> &Mutex<()> {
        &self.run_lock
    }
}

/// Remember which collection and model this index file belongs to, and warn
/// when the configuration no longer matches.
fn record_index_identity(conn: &Connection, config: &JournalConfig) -> Result<()> {
    match migrations::get_collection(conn)? {
        None => migrations::set_collection(conn, &config.storage.collection)?,
        Some(stored) if stored != config.storage.collection => tracing::warn!(
            stored = %stored,
            configured = %config.storage.collection,
            "index file belongs to a different collection"
        ),
        Some(_) => {}
    }

    match migrations::get_embedding_model(conn)? {
        None => migrations::set_embedding_model(conn, &config.embedding.model)?,
        Some(stored) if stored != config.embedding.model => tracing::warn!(
            stored = %stored,
            configured = %config.embedding.model,
            "embedding model changed, run `journal-mcp index --full` to rebuild vectors"
        ),
        Some(_) => {}
    }
    Ok(())
}
