use anyhow::Result;

use crate::config::JournalConfig;
use crate::journal::JournalContext;

const PREVIEW_CHARS: usize = 160;

/// Run a semantic search from the terminal.
pub fn search(config: JournalConfig, query: &str, n_results: Option<usize>) -> Result<()> {
    let k = n_results.unwrap_or(config.retrieval.default_n_results);
    let ctx = JournalContext::open(config)?;
    let hits = ctx.search(query, k)?;

    if hits.is_empty() {
        println!("No results found.");
        return Ok(());
    }

    println!("Found {} result(s)\n", hits.len());
    for (i, hit) in hits.iter().enumerate() {
        let flat = hit.text.split_whitespace().collect::<Vec<_>>().join(" ");
        let preview: String = flat.chars().take(PREVIEW_CHARS).collect();
        let ellipsis = if flat.chars().count() > PREVIEW_CHARS { "..." } else { "" };

        println!(
            "  {}. {} [{}] ({}, distance: {:.4})",
            i + 1,
            hit.source,
            hit.date,
            hit.chunk_type,
            hit.distance
        );
        println!("     {preview}{ellipsis}");
        println!();
    }
    Ok(())
}
