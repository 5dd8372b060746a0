//! MCP server startup for stdio and streamable HTTP transports.
//!
//! [`serve_journal`] runs the semantic search server and [`serve_frontmatter`]
//! the frontmatter query server. Both pick their transport from
//! `server.transport`.

use std::sync::Arc;

use anyhow::Result;
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::streamable_http_server::StreamableHttpService;
use rmcp::{ServerHandler, ServiceExt};

use crate::config::JournalConfig;
use crate::journal::JournalContext;
use crate::tools::{FrontmatterTools, JournalTools};

/// Start the semantic search server. Fails up front if the index or the
/// embedding model cannot be initialized.
pub async fn serve_journal(config: JournalConfig) -> Result<()> {
    let transport = config.server.transport.clone();
    let bind_addr = bind_addr(&config);

    let ctx = tokio::task::spawn_blocking(move || JournalContext::open(config)).await??;
    let ctx = Arc::new(ctx);

    run(&transport, &bind_addr, "journal", move || {
        JournalTools::new(Arc::clone(&ctx))
    })
    .await
}

/// Start the frontmatter query server.
pub async fn serve_frontmatter(config: JournalConfig) -> Result<()> {
    let transport = config.server.transport.clone();
    let bind_addr = bind_addr(&config);
    let config = Arc::new(config);

    run(&transport, &bind_addr, "frontmatter", move || {
        FrontmatterTools::new(Arc::clone(&config))
    })
    .await
}

fn bind_addr(config: &JournalConfig) -> String {
    format!("{}:{}", config.server.host, config.server.port)
}

async fn run<S, F>(transport: &str, bind_addr: &str, name: &str, make: F) -> Result<()>
where
    S: ServerHandler,
    F: Fn() -> S + Send + Sync + 'static,
{
    match transport {
        "stdio" => serve_stdio(name, make()).await,
        "http" => serve_http(name, bind_addr, make).await,
        other => anyhow::bail!("unknown transport: {other}. Supported: stdio, http"),
    }
}

async fn serve_stdio<S: ServerHandler>(name: &str, tools: S) -> Result<()> {
    tracing::info!(server = name, "starting MCP server on stdio");

    let server = tools.serve(rmcp::transport::stdio()).await?;
    tracing::info!(server = name, "MCP server running, waiting for client");

    server.waiting().await?;
    tracing::info!(server = name, "MCP server shut down");
    Ok(())
}

async fn serve_http<S, F>(name: &str, bind_addr: &str, make: F) -> Result<()>
where
    S: ServerHandler,
    F: Fn() -> S + Send + Sync + 'static,
{
    let service = StreamableHttpService::new(
        move || Ok(make()),
        LocalSessionManager::default().into(),
        Default::default(),
    );
    let router = axum::Router::new().nest_service("/mcp", service);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!(server = name, addr = %bind_addr, "MCP server listening at http://{bind_addr}/mcp");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
            tracing::info!("shutting down HTTP server");
        })
        .await?;

    Ok(())
}
