mod cli;
mod config;
mod db;
mod embedding;
mod error;
mod fields;
mod journal;
mod server;
mod tools;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use config::JournalConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "journal-mcp",
    version,
    about = "MCP servers for semantic search and frontmatter queries over a markdown journal"
)]
struct Cli {
    /// Config file (default: ~/.journal-mcp/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the semantic search MCP server (query_journal, update_index)
    Serve,
    /// Start the frontmatter MCP server (query_frontmatter)
    ServeFrontmatter,
    /// Index new or modified journal entries
    Index {
        /// Reindex every entry regardless of modification time
        #[arg(long)]
        full: bool,
    },
    /// Semantic search from the terminal
    Search {
        query: String,
        /// Number of entries to return
        #[arg(short = 'n', long)]
        n_results: Option<usize>,
    },
    /// Query frontmatter fields across dated entries
    Fields {
        /// Fields to extract (repeatable or comma-separated)
        #[arg(long, value_delimiter = ',')]
        fields: Option<Vec<String>>,
        /// First day to include (YYYY-MM-DD)
        #[arg(long)]
        start_date: Option<String>,
        /// Last day to include (YYYY-MM-DD)
        #[arg(long)]
        end_date: Option<String>,
        /// Print per-field statistics
        #[arg(long)]
        stats: bool,
        /// json, csv or table
        #[arg(long)]
        format: Option<String>,
    },
    /// Show index statistics
    Stats,
    /// Manage the embedding model
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },
}

#[derive(Subcommand)]
enum ModelAction {
    /// Download the embedding model to the configured cache directory
    Download,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => JournalConfig::load_from(path)?,
        None => JournalConfig::load()?,
    };

    // stdout carries JSON-RPC frames when serving, so logs go to stderr.
    let filter =
        EnvFilter::try_new(&config.server.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve => server::serve_journal(config).await?,
        Command::ServeFrontmatter => server::serve_frontmatter(config).await?,
        Command::Index { full } => {
            tokio::task::spawn_blocking(move || cli::index::index(config, full)).await??
        }
        Command::Search { query, n_results } => {
            tokio::task::spawn_blocking(move || cli::search::search(config, &query, n_results))
                .await??
        }
        Command::Fields {
            fields,
            start_date,
            end_date,
            stats,
            format,
        } => cli::fields::fields(
            &config,
            fields,
            start_date.as_deref(),
            end_date.as_deref(),
            stats,
            format.as_deref(),
        )?,
        Command::Stats => cli::stats::stats(&config)?,
        Command::Model { action } => match action {
            ModelAction::Download => cli::model_download(&config.embedding).await?,
        },
    }

    Ok(())
}
