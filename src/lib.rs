//! Journal MCP: semantic search and frontmatter queries over a personal markdown journal.
//!
//! Two [MCP](https://modelcontextprotocol.io/) servers are exposed by the
//! `journal-mcp` binary:
//!
//! | Server | Tools | Needs |
//! |--------|-------|-------|
//! | `serve` | `query_journal`, `update_index` | index file + local embedding model |
//! | `serve-frontmatter` | `query_frontmatter` | the journal directory only |
//!
//! # Architecture
//!
//! - **Discovery**: recursive walk of the journal root, YAML frontmatter split from the body
//! - **Chunking**: 500-character windows overlapping by 50; single-window entries are full entries
//! - **Storage**: SQLite with [sqlite-vec](https://github.com/asg017/sqlite-vec) for KNN search
//! - **Embeddings**: Local ONNX Runtime with all-MiniLM-L6-v2 (384 dimensions)
//! - **Indexing**: incremental by modification time against a persisted watermark
//! - **Search**: over-fetch, one result per entry, partial windows expanded to the full entry
//! - **Transport**: MCP over stdio (default) or streamable HTTP
//!
//! # Modules
//!
//! - [`config`] - Configuration loading from TOML files and environment variables
//! - [`db`] - SQLite initialization, schema and migrations
//! - [`embedding`] - Text-to-vector embedding via ONNX Runtime
//! - [`journal`] - Discovery, chunking, index store, indexer and retriever
//! - [`fields`] - Frontmatter field queries and statistics
//! - [`error`] - Error types shared by the public operations

pub mod config;
pub mod db;
pub mod embedding;
pub mod error;
pub mod fields;
pub mod journal;
