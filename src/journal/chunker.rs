//! Fixed-size, overlapping character windows over an entry body.

use super::types::{Chunk, ChunkType, Document};
use crate::config::ChunkingConfig;

/// Stable id of window `index` of `source`.
pub fn chunk_id(source: &str, index: usize) -> String {
    format!("{source}_{index}")
}

/// Id of the companion full-entry record of a multi-chunk `source`.
pub fn full_entry_id(source: &str) -> String {
    format!("{source}_full")
}

/// Split `text` into windows of at most `chunk_size` characters, each starting
/// `chunk_size - chunk_overlap` characters after the previous one. Whitespace-only
/// text yields nothing.
pub fn split_text<'a>(text: &'a str, config: &ChunkingConfig) -> Vec<&'a str> {
    if text.trim().is_empty() || config.chunk_size == 0 {
        return Vec::new();
    }

    // Byte offset of every char boundary, including the end of the string.
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let len = bounds.len() - 1;
    let stride = config.stride().max(1);

    let mut windows = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + config.chunk_size).min(len);
        windows.push(&text[bounds[start]..bounds[end]]);
        if end == len {
            break;
        }
        start += stride;
    }
    windows
}

/// Chunk one document. A single window is tagged [`ChunkType::FullEntry`];
/// when there are several, each is a [`ChunkType::PartialEntry`].
pub fn chunk_document(doc: &Document, config: &ChunkingConfig) -> Vec<Chunk> {
    let windows = split_text(&doc.body, config);
    let chunk_type = if windows.len() == 1 {
        ChunkType::FullEntry
    } else {
        ChunkType::PartialEntry
    };

    windows
        .into_iter()
        .enumerate()
        .map(|(index, text)| Chunk {
            id: chunk_id(&doc.source, index),
            source: doc.source.clone(),
            chunk_index: Some(index),
            chunk_type,
            text: text.to_string(),
            metadata: doc.metadata.clone(),
        })
        .collect()
}

/// The un-embedded record holding a whole multi-chunk entry, used to expand
/// partial matches.
pub fn full_entry_record(doc: &Document) -> Chunk {
    Chunk {
        id: full_entry_id(&doc.source),
        source: doc.source.clone(),
        chunk_index: None,
        chunk_type: ChunkType::FullEntry,
        text: doc.body.clone(),
        metadata: doc.metadata.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::types::EntryMetadata;

    fn doc(source: &str, body: String) -> Document {
        Document {
            source: source.into(),
            metadata: EntryMetadata::default(),
            body,
        }
    }

    fn config() -> ChunkingConfig {
        ChunkingConfig::default()
    }

    #[test]
    fn short_entry_is_one_full_chunk() {
        let chunks = chunk_document(&doc("a.md", "x".repeat(400)), &config());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_type, ChunkType::FullEntry);
        assert_eq!(chunks[0].id, "a.md_0");
        assert_eq!(chunks[0].text.len(), 400);
    }

    #[test]
    fn exactly_chunk_size_is_one_chunk() {
        let chunks = chunk_document(&doc("a.md", "y".repeat(500)), &config());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_type, ChunkType::FullEntry);
    }

    #[test]
    fn long_entry_windows_overlap() {
        let body: String = (0..1200).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let chunks = chunk_document(&doc("b.md", body.clone()), &config());

        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chunk_type == ChunkType::PartialEntry));
        assert_eq!(chunks[0].text, body[0..500]);
        assert_eq!(chunks[1].text, body[450..950]);
        assert_eq!(chunks[2].text, body[900..1200]);
        for pair in chunks.windows(2) {
            let tail = &pair[0].text[pair[0].text.len() - 50..];
            assert!(pair[1].text.starts_with(tail));
        }
        let ids: Vec<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["b.md_0", "b.md_1", "b.md_2"]);
    }

    #[test]
    fn twice_chunk_size_gives_several_chunks() {
        let chunks = chunk_document(&doc("c.md", "z".repeat(1000)), &config());
        assert!(chunks.len() >= 2);
    }

    #[test]
    fn blank_body_gives_no_chunks() {
        assert!(chunk_document(&doc("e.md", String::new()), &config()).is_empty());
        assert!(chunk_document(&doc("e.md", " \n\t ".into()), &config()).is_empty());
    }

    #[test]
    fn windows_count_characters_not_bytes() {
        let body = "é".repeat(600);
        let windows = split_text(&body, &config());
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].chars().count(), 500);
        assert_eq!(windows[1].chars().count(), 150);
    }

    #[test]
    fn chunking_is_deterministic() {
        let body = "Morning pages. ".repeat(90);
        let first = chunk_document(&doc("d.md", body.clone()), &config());
        let second = chunk_document(&doc("d.md", body), &config());
        assert_eq!(first, second);
    }

    #[test]
    fn companion_record_holds_whole_body() {
        let d = doc("2024/b.md", "w".repeat(1200));
        let full = full_entry_record(&d);
        assert_eq!(full.id, "2024/b.md_full");
        assert_eq!(full.chunk_type, ChunkType::FullEntry);
        assert_eq!(full.chunk_index, None);
        assert_eq!(full.text, d.body);
    }

    #[test]
    fn unvalidated_overlap_advances_one_char() {
        let config = ChunkingConfig {
            chunk_size: 10,
            chunk_overlap: 20,
        };
        let body: String = (0..25).map(|i| char::from(b'a' + i as u8)).collect();
        let windows = split_text(&body, &config);
        assert_eq!(windows.len(), 16);
        assert_eq!(windows[0], "abcdefghij");
        assert_eq!(windows[15], "pqrstuvwxy");
    }
}
