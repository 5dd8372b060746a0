use anyhow::Result;

use crate::config::JournalConfig;
use crate::db::migrations;
use crate::journal::store::{IndexStore, SqliteIndexStore};
use crate::journal::watermark::Watermark;

/// Display index statistics. Does not load the embedding model.
pub fn stats(config: &JournalConfig) -> Result<()> {
    let db_path = config.resolved_db_path();
    let store = SqliteIndexStore::open(&db_path)?;

    let (schema_version, model, collection) = store.with_connection(|conn| {
        Ok((
            migrations::get_schema_version(conn)?,
            migrations::get_embedding_model(conn)?,
            migrations::get_collection(conn)?,
        ))
    })?;
    let embedded = store.count()?;
    let sources = store.sources()?;
    let watermark = Watermark::new(config.resolved_watermark_path()).read();

    println!("Journal Index");
    println!("{}", "=".repeat(40));
    println!("  Index file:          {}", db_path.display());
    println!("  Schema version:      {schema_version}");
    println!("  Collection:          {}", collection.as_deref().unwrap_or("(unset)"));
    println!("  Embedding model:     {}", model.as_deref().unwrap_or("(unset)"));
    println!("  Entries indexed:     {}", sources.len());
    println!("  Searchable chunks:   {embedded}");

    if watermark > 0.0 {
        let when = chrono::DateTime::from_timestamp(watermark as i64, 0)
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| watermark.to_string());
        println!("  Last indexed:        {when}");
    } else {
        println!("  Last indexed:        never");
    }

    if let Ok(meta) = std::fs::metadata(&db_path) {
        println!("  Index size:          {} bytes", meta.len());
    }
    Ok(())
}
