//! Query path: embed, over-fetch, deduplicate by source, expand partial hits.
//!
//! Candidates are consumed in the store's ranked order. The first candidate
//! of each source wins; a partial window is swapped for its source's full
//! entry while keeping the window's distance. Accumulation stops at `k`. When
//! the over-fetched page runs out of new sources before `k` is reached and the
//! store holds more candidates, the page is widened and the walk resumes, so
//! the result has exactly `min(k, distinct sources)` entries.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use super::types::{Candidate, Chunk, ChunkType, MetaValue, RecordFilter};
use super::JournalContext;
use crate::error::JournalError;

/// Date shown when an entry has neither `date` nor `created`.
pub const UNKNOWN_DATE: &str = "unknown";

/// One search result.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchHit {
    pub source: String,
    pub date: String,
    pub text: String,
    pub distance: f64,
    pub chunk_type: ChunkType,
    pub context_note: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, MetaValue>,
}

impl SearchHit {
    fn new(chunk: Chunk, distance: f64) -> Self {
        let context_note = match chunk.chunk_type {
            ChunkType::FullEntry => format!("Full entry from {}", chunk.source),
            ChunkType::PartialEntry => format!("Excerpt from {}", chunk.source),
        };
        Self {
            date: chunk
                .metadata
                .resolved_date()
                .unwrap_or(UNKNOWN_DATE)
                .to_string(),
            source: chunk.source,
            text: chunk.text,
            distance,
            chunk_type: chunk.chunk_type,
            context_note,
            metadata: chunk.metadata.extra,
        }
    }
}

/// Search the index. `k` must be at least 1 and `query` must contain
/// something other than whitespace; both are checked before any provider or
/// store call.
pub fn search(ctx: &JournalContext, query: &str, k: usize) -> Result<Vec<SearchHit>, JournalError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(JournalError::invalid("query must not be empty"));
    }
    if k == 0 {
        return Err(JournalError::invalid("n_results must be at least 1"));
    }

    let embedding = ctx.embedding.embed(query).map_err(JournalError::Embedding)?;

    let mut limit = k.saturating_mul(ctx.config.retrieval.overfetch_factor.max(1));
    let mut seen = HashSet::new();
    // `k` is unbounded here, so no preallocation.
    let mut hits = Vec::new();
    let mut available = None;

    loop {
        let candidates = ctx
            .store
            .query(&embedding, limit)
            .map_err(JournalError::Store)?;
        let exhausted = candidates.len() < limit;

        for candidate in candidates {
            if hits.len() == k {
                break;
            }
            // Candidates from an earlier, narrower page land here again and
            // fall through on this check.
            if !seen.insert(candidate.chunk.source.clone()) {
                continue;
            }
            hits.push(expand(ctx, candidate));
        }

        if hits.len() == k || exhausted {
            break;
        }
        let total = match available {
            Some(total) => total,
            None => *available.insert(ctx.store.count().map_err(JournalError::Store)?),
        };
        if limit >= total {
            break;
        }
        tracing::debug!(limit, total, found = hits.len(), "widening candidate page");
        limit = limit.saturating_mul(2).min(total);
    }

    tracing::info!(k, results = hits.len(), "search complete");
    Ok(hits)
}

/// Swap a partial window for its source's full entry, keeping the window's distance.
fn expand(ctx: &JournalContext, candidate: Candidate) -> SearchHit {
    let Candidate { chunk, distance } = candidate;
    if chunk.chunk_type == ChunkType::PartialEntry {
        match ctx.store.get(&RecordFilter::full_entry(&chunk.source)) {
            Ok(found) => {
                if let Some(full) = found.into_iter().next() {
                    return SearchHit::new(full, distance);
                }
                tracing::debug!(source = %chunk.source, "no full entry stored, keeping excerpt");
            }
            Err(e) => {
                tracing::warn!(source = %chunk.source, error = %format!("{e:#}"), "full entry lookup failed, keeping excerpt");
            }
        }
    }
    SearchHit::new(chunk, distance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::types::EntryMetadata;

    fn chunk(chunk_type: ChunkType, metadata: EntryMetadata) -> Chunk {
        Chunk {
            id: "2024-01-05.md_0".into(),
            source: "2024-01-05.md".into(),
            chunk_index: Some(0),
            chunk_type,
            text: "Snow all morning.".into(),
            metadata,
        }
    }

    #[test]
    fn hit_uses_created_when_date_missing() {
        let metadata = EntryMetadata {
            created: Some("2024-01-05".into()),
            ..Default::default()
        };
        let hit = SearchHit::new(chunk(ChunkType::FullEntry, metadata), 0.25);
        assert_eq!(hit.date, "2024-01-05");
        assert_eq!(hit.context_note, "Full entry from 2024-01-05.md");
        assert_eq!(hit.distance, 0.25);
    }

    #[test]
    fn hit_without_dates_is_unknown() {
        let hit = SearchHit::new(chunk(ChunkType::PartialEntry, EntryMetadata::default()), 1.0);
        assert_eq!(hit.date, UNKNOWN_DATE);
        assert_eq!(hit.context_note, "Excerpt from 2024-01-05.md");
    }

    #[test]
    fn hit_json_shape() {
        let mut metadata = EntryMetadata {
            date: Some("2024-01-05".into()),
            ..Default::default()
        };
        metadata.extra.insert("mood".into(), MetaValue::Integer(4));
        let json = serde_json::to_value(SearchHit::new(chunk(ChunkType::FullEntry, metadata), 0.5)).unwrap();
        assert_eq!(json["chunk_type"], "full_entry");
        assert_eq!(json["metadata"]["mood"], 4);
        assert_eq!(json["date"], "2024-01-05");
    }
}
