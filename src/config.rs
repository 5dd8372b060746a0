use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct JournalConfig {
    pub server: ServerConfig,
    pub journal: JournalDirConfig,
    pub storage: StorageConfig,
    pub embedding: EmbeddingConfig,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub fields: FieldsConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub transport: String,
    pub log_level: String,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct JournalDirConfig {
    pub root: String,
    /// File extensions (without the dot) treated as journal entries.
    pub extensions: Vec<String>,
    /// File-name prefixes skipped during discovery (e.g. `"template"`).
    pub skip_prefixes: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
    pub watermark_path: String,
    pub collection: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub model: String,
    pub cache_dir: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum characters per chunk.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks.
    pub chunk_overlap: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    pub default_n_results: usize,
    pub overfetch_factor: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FieldsConfig {
    pub default_fields: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: "stdio".into(),
            log_level: "info".into(),
            host: "127.0.0.1".into(),
            port: 8765,
        }
    }
}

impl Default for JournalDirConfig {
    fn default() -> Self {
        let root = home_dir().join("journal").to_string_lossy().into_owned();
        Self {
            root,
            extensions: vec!["md".into()],
            skip_prefixes: Vec::new(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let dir = default_data_dir();
        Self {
            db_path: dir.join("index.db").to_string_lossy().into_owned(),
            watermark_path: dir
                .join("last_indexed_time.txt")
                .to_string_lossy()
                .into_owned(),
            collection: "life_journal_collection".into(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        let cache_dir = default_data_dir()
            .join("models")
            .to_string_lossy()
            .into_owned();
        Self {
            provider: "local".into(),
            model: "all-MiniLM-L6-v2".into(),
            cache_dir,
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_n_results: 10,
            overfetch_factor: 2,
        }
    }
}

impl Default for FieldsConfig {
    fn default() -> Self {
        Self {
            default_fields: vec!["mood".into(), "anxiety".into(), "weight_kg".into()],
        }
    }
}

impl ChunkingConfig {
    /// Distance between the start of one chunk and the start of the next.
    /// Zero when the overlap is not smaller than the chunk size.
    pub fn stride(&self) -> usize {
        self.chunk_size.saturating_sub(self.chunk_overlap)
    }
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Returns `~/.journal-mcp/`
pub fn default_data_dir() -> PathBuf {
    home_dir().join(".journal-mcp")
}

/// Returns the default config file path: `~/.journal-mcp/config.toml`
pub fn default_config_path() -> PathBuf {
    default_data_dir().join("config.toml")
}

impl JournalConfig {
    /// Load config from the default TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides and validate.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            JournalConfig::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides (JOURNAL_MCP_ROOT, JOURNAL_MCP_DB, JOURNAL_MCP_LOG_LEVEL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("JOURNAL_MCP_ROOT") {
            self.journal.root = val;
        }
        if let Ok(val) = std::env::var("JOURNAL_MCP_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("JOURNAL_MCP_LOG_LEVEL") {
            self.server.log_level = val;
        }
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.chunking.chunk_size > 0,
            "chunking.chunk_size must be greater than zero"
        );
        anyhow::ensure!(
            self.chunking.chunk_overlap < self.chunking.chunk_size,
            "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
            self.chunking.chunk_overlap,
            self.chunking.chunk_size
        );
        anyhow::ensure!(
            self.retrieval.default_n_results > 0,
            "retrieval.default_n_results must be at least 1"
        );
        anyhow::ensure!(
            !self.journal.extensions.is_empty(),
            "journal.extensions must name at least one extension"
        );
        Ok(())
    }

    pub fn resolved_journal_root(&self) -> PathBuf {
        expand_tilde(&self.journal.root)
    }

    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }

    pub fn resolved_watermark_path(&self) -> PathBuf {
        expand_tilde(&self.storage.watermark_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        home_dir().join(rest)
    } else {
        PathBuf::from(path)
    }
}
