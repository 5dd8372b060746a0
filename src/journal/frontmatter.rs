//! Split a markdown entry into YAML frontmatter and body.

use std::path::Path;

use yaml_rust2::{Yaml, YamlLoader};

use super::types::{EntryMetadata, MetaValue};
use crate::error::FrontmatterError;

/// Keys owned by the indexer. Frontmatter values under these names are dropped.
const RESERVED_KEYS: &[&str] = &["source", "chunk_index", "chunk_type"];

#[derive(Debug, Clone, Default)]
pub struct ParsedEntry {
    pub metadata: EntryMetadata,
    pub body: String,
}

/// Read and parse one journal file.
pub fn parse_file(path: &Path) -> Result<ParsedEntry, FrontmatterError> {
    let text = std::fs::read_to_string(path).map_err(|source| FrontmatterError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_entry(&text)
}

/// Parse entry text.
///
/// Text that does not open with a `---` line has no frontmatter. Otherwise the
/// block runs to the next `---` or `...` line and must be a YAML mapping. The
/// returned body is trimmed.
pub fn parse_entry(text: &str) -> Result<ParsedEntry, FrontmatterError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text.split_inclusive('\n');

    let opening = match lines.next() {
        Some(line) if line.trim_end() == "---" => line,
        _ => {
            return Ok(ParsedEntry {
                metadata: EntryMetadata::default(),
                body: text.trim().to_string(),
            })
        }
    };

    let mut offset = opening.len();
    for line in lines {
        let marker = line.trim_end();
        if marker == "---" || marker == "..." {
            let metadata = parse_metadata(&text[opening.len()..offset])?;
            let body = text[offset + line.len()..].trim().to_string();
            return Ok(ParsedEntry { metadata, body });
        }
        offset += line.len();
    }

    Err(FrontmatterError::Unterminated)
}

fn parse_metadata(yaml: &str) -> Result<EntryMetadata, FrontmatterError> {
    let docs =
        YamlLoader::load_from_str(yaml).map_err(|e| FrontmatterError::Yaml(e.to_string()))?;

    let hash = match docs.into_iter().next() {
        None | Some(Yaml::Null) => return Ok(EntryMetadata::default()),
        Some(Yaml::Hash(hash)) => hash,
        Some(_) => return Err(FrontmatterError::NotAMapping),
    };

    let mut metadata = EntryMetadata::default();
    for (key, value) in hash {
        let Some(key) = scalar_key(&key) else {
            continue;
        };
        let Some(value) = to_meta_value(value) else {
            continue;
        };
        match key.as_str() {
            "date" => metadata.date = Some(value.to_string()),
            "created" => metadata.created = Some(value.to_string()),
            k if RESERVED_KEYS.contains(&k) => {
                tracing::debug!(key = k, "dropping reserved frontmatter key");
            }
            _ => {
                metadata.extra.insert(key, value);
            }
        }
    }
    Ok(metadata)
}

fn scalar_key(key: &Yaml) -> Option<String> {
    match key {
        Yaml::String(s) | Yaml::Real(s) => Some(s.clone()),
        Yaml::Integer(i) => Some(i.to_string()),
        Yaml::Boolean(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Nulls vanish; sequences and mappings are rendered as JSON text.
fn to_meta_value(value: Yaml) -> Option<MetaValue> {
    match value {
        Yaml::String(s) => Some(MetaValue::Text(s)),
        Yaml::Integer(i) => Some(MetaValue::Integer(i)),
        Yaml::Boolean(b) => Some(MetaValue::Bool(b)),
        Yaml::Real(ref raw) => match value.as_f64() {
            Some(f) if f.is_finite() => Some(MetaValue::Float(f)),
            _ => Some(MetaValue::Text(raw.clone())),
        },
        Yaml::Array(_) | Yaml::Hash(_) => Some(MetaValue::Text(yaml_to_json(&value).to_string())),
        Yaml::Null | Yaml::Alias(_) | Yaml::BadValue => None,
    }
}

fn yaml_to_json(value: &Yaml) -> serde_json::Value {
    match value {
        Yaml::String(s) => serde_json::Value::String(s.clone()),
        Yaml::Integer(i) => serde_json::Value::from(*i),
        Yaml::Real(raw) => value
            .as_f64()
            .and_then(serde_json::Number::from_f64)
            .map(serde_json::Value::Number)
            .unwrap_or_else(|| serde_json::Value::String(raw.clone())),
        Yaml::Boolean(b) => serde_json::Value::Bool(*b),
        Yaml::Array(items) => serde_json::Value::Array(items.iter().map(yaml_to_json).collect()),
        Yaml::Hash(hash) => serde_json::Value::Object(
            hash.iter()
                .filter_map(|(k, v)| scalar_key(k).map(|k| (k, yaml_to_json(v))))
                .collect(),
        ),
        Yaml::Null | Yaml::Alias(_) | Yaml::BadValue => serde_json::Value::Null,
    }
}
