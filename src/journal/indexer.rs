//! Incremental indexer.
//!
//! A run discovers journal files, keeps those modified after the watermark
//! (or all of them for a full run), parses and chunks them, embeds every
//! window in one batch and upserts the lot. The watermark only moves after the
//! upsert commits, so a failed run is retried from the same point next time.

use std::collections::HashSet;
use std::sync::TryLockError;

use anyhow::{Context, Result};
use serde::Serialize;

use super::chunker::{chunk_document, full_entry_record};
use super::frontmatter;
use super::scan::scan_journal;
use super::types::{Document, IndexRecord};
use super::watermark::now_seconds;
use super::JournalContext;

/// Outcome of one indexing run.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct IndexReport {
    pub success: bool,
    /// Selected files that parsed successfully.
    pub files_processed: usize,
    /// Selected files that failed to parse.
    pub files_skipped: usize,
    /// Embedded windows written to the store.
    pub chunks_indexed: usize,
    pub message: String,
}

impl IndexReport {
    fn succeeded(files_processed: usize, files_skipped: usize, chunks_indexed: usize, message: String) -> Self {
        Self {
            success: true,
            files_processed,
            files_skipped,
            chunks_indexed,
            message,
        }
    }

    fn failed(message: String) -> Self {
        Self {
            success: false,
            files_processed: 0,
            files_skipped: 0,
            chunks_indexed: 0,
            message,
        }
    }
}

/// Run one indexing pass. Never panics on bad input; failures come back as
/// `success == false`.
pub fn run(ctx: &JournalContext, full: bool) -> IndexReport {
    let _guard = match ctx.run_lock().try_lock() {
        Ok(guard) => guard,
        Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        Err(TryLockError::WouldBlock) => {
            tracing::warn!("index update requested while another is running");
            return IndexReport::failed("Another index update is already running.".into());
        }
    };

    let started = std::time::Instant::now();
    match try_run(ctx, full) {
        Ok(report) => {
            tracing::info!(
                full,
                files = report.files_processed,
                skipped = report.files_skipped,
                chunks = report.chunks_indexed,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "index run finished"
            );
            report
        }
        Err(e) => {
            tracing::error!(full, error = %format!("{e:#}"), "index run failed");
            IndexReport::failed(format!("{e:#}"))
        }
    }
}

fn try_run(ctx: &JournalContext, full: bool) -> Result<IndexReport> {
    let config = &ctx.config;
    let run_started = now_seconds();

    let root = config.resolved_journal_root();
    let files = scan_journal(&root, &config.journal.extensions, &config.journal.skip_prefixes)?;

    let selected: Vec<_> = if full {
        tracing::info!(root = %root.display(), "full reindex of all journal entries");
        files.iter().collect()
    } else {
        let since = ctx.watermark.read();
        tracing::info!(root = %root.display(), since, "incremental index update");
        files.iter().filter(|f| f.modified > since).collect()
    };

    if selected.is_empty() {
        return Ok(IndexReport::succeeded(
            0,
            0,
            0,
            "No new or modified journal entries found.".into(),
        ));
    }
    tracing::info!(files = selected.len(), "found files to process");

    let mut documents = Vec::with_capacity(selected.len());
    let mut skipped = 0;
    for file in selected {
        match frontmatter::parse_file(&file.path) {
            Ok(entry) => documents.push(Document {
                source: file.source.clone(),
                metadata: entry.metadata,
                body: entry.body,
            }),
            Err(e) => {
                tracing::warn!(source = %file.source, error = %e, "skipping unparseable journal entry");
                skipped += 1;
            }
        }
    }

    let mut windows = Vec::new();
    let mut companions = Vec::new();
    let mut blank_sources = Vec::new();
    for doc in &documents {
        let chunks = chunk_document(doc, &config.chunking);
        match chunks.len() {
            0 => blank_sources.push(doc.source.clone()),
            1 => {}
            _ => companions.push(full_entry_record(doc)),
        }
        windows.extend(chunks);
    }

    if windows.is_empty() {
        return Ok(IndexReport::succeeded(
            documents.len(),
            skipped,
            0,
            format!("No chunks generated from {} files.", documents.len()),
        ));
    }
    tracing::info!(chunks = windows.len(), companions = companions.len(), "split into chunks");

    let texts: Vec<&str> = windows.iter().map(|c| c.text.as_str()).collect();
    let embeddings = ctx
        .embedding
        .embed_batch(&texts)
        .context("failed to embed journal chunks")?;
    anyhow::ensure!(
        embeddings.len() == windows.len(),
        "embedding provider returned {} vectors for {} chunks",
        embeddings.len(),
        windows.len()
    );

    let chunks_indexed = windows.len();
    let records: Vec<IndexRecord> = windows
        .into_iter()
        .zip(embeddings)
        .map(|(chunk, embedding)| IndexRecord::embedded(chunk, embedding))
        .chain(companions.into_iter().map(IndexRecord::text_only))
        .collect();

    ctx.store
        .upsert(&records)
        .context("failed to write chunks to the index store")?;

    if let Err(e) = ctx.watermark.write(run_started) {
        tracing::error!(error = %format!("{e:#}"), "index updated but watermark could not be saved");
    }

    if !blank_sources.is_empty() {
        if let Err(e) = ctx.store.remove_sources(&blank_sources) {
            tracing::warn!(error = %format!("{e:#}"), "failed to drop entries that are now empty");
        }
    }
    if full {
        prune_missing(ctx, files.iter().map(|f| f.source.as_str()).collect());
    }

    Ok(IndexReport::succeeded(
        documents.len(),
        skipped,
        chunks_indexed,
        format!(
            "Successfully indexed {chunks_indexed} chunks from {} files.",
            documents.len()
        ),
    ))
}

/// Drop stored sources that no longer exist on disk.
fn prune_missing(ctx: &JournalContext, on_disk: HashSet<&str>) {
    let stale: Vec<String> = match ctx.store.sources() {
        Ok(sources) => sources
            .into_iter()
            .filter(|s| !on_disk.contains(s.as_str()))
            .collect(),
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), "could not list indexed sources for pruning");
            return;
        }
    };
    if stale.is_empty() {
        return;
    }
    match ctx.store.remove_sources(&stale) {
        Ok(removed) => tracing::info!(sources = stale.len(), removed, "pruned deleted entries"),
        Err(e) => tracing::warn!(error = %format!("{e:#}"), "failed to prune deleted entries"),
    }
}
