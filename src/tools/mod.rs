pub mod query_frontmatter;
pub mod query_journal;
pub mod update_index;

use std::sync::Arc;

use query_frontmatter::QueryFrontmatterParams;
use query_journal::QueryJournalParams;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::Serialize;
use update_index::UpdateIndexParams;

use crate::config::JournalConfig;
use crate::error::JournalError;
use crate::fields::{self, FieldQuery};
use crate::journal::JournalContext;

/// Caller mistakes become `invalid params`; everything else is an internal error.
fn to_mcp_error(err: JournalError, action: &str) -> McpError {
    if err.is_client_error() {
        McpError::invalid_params(err.to_string(), None)
    } else {
        tracing::error!(error = %err, "{action} failed");
        McpError::internal_error(format!("{action} failed: {err}"), None)
    }
}

fn join_error(err: tokio::task::JoinError) -> McpError {
    McpError::internal_error(format!("worker task failed: {err}"), None)
}

fn pretty_json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("serialization failed: {e}"), None))?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

/// Semantic search server: `query_journal` and `update_index`.
#[derive(Clone)]
pub struct JournalTools {
    tool_router: ToolRouter<Self>,
    ctx: Arc<JournalContext>,
}

#[tool_router]
impl JournalTools {
    pub fn new(ctx: Arc<JournalContext>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            ctx,
        }
    }

    /// Semantic search over journal entries.
    #[tool(description = "Queries the personal journal entries using semantic search. Returns one result per entry, nearest first, as a JSON array of {source, date, text, distance, chunk_type, context_note}.")]
    async fn query_journal(
        &self,
        Parameters(params): Parameters<QueryJournalParams>,
    ) -> Result<CallToolResult, McpError> {
        let k = match params.n_results {
            None => self.ctx.config.retrieval.default_n_results,
            Some(n) if n >= 1 => n as usize,
            Some(n) => {
                return Err(McpError::invalid_params(
                    format!("n_results must be a positive integer, got {n}"),
                    None,
                ))
            }
        };
        tracing::info!(query_len = params.query.len(), k, "query_journal called");

        // Embedding and KNN are blocking.
        let ctx = Arc::clone(&self.ctx);
        let query = params.query;
        let hits = tokio::task::spawn_blocking(move || ctx.search(&query, k))
            .await
            .map_err(join_error)?
            .map_err(|e| to_mcp_error(e, "Query execution"))?;

        pretty_json(&hits)
    }

    /// Bring the index up to date with the journal directory.
    #[tool(description = "Updates the journal index with new or modified entries. Set full_reindex=true to rebuild from every entry.")]
    async fn update_index(
        &self,
        Parameters(params): Parameters<UpdateIndexParams>,
    ) -> Result<CallToolResult, McpError> {
        let full = params.full_reindex.unwrap_or(false);
        tracing::info!(full, "update_index called");

        let ctx = Arc::clone(&self.ctx);
        let report = tokio::task::spawn_blocking(move || ctx.index(full))
            .await
            .map_err(join_error)?;

        if report.success {
            Ok(CallToolResult::success(vec![Content::text(report.message)]))
        } else {
            Err(McpError::internal_error(
                format!("Index update failed: {}", report.message),
                serde_json::to_value(&report).ok(),
            ))
        }
    }
}

#[tool_handler]
impl ServerHandler for JournalTools {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Semantic search over a personal markdown journal. Use query_journal to find \
                 entries by meaning and update_index after entries are added or edited."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

/// Frontmatter server: `query_frontmatter`. Needs no index or model.
#[derive(Clone)]
pub struct FrontmatterTools {
    tool_router: ToolRouter<Self>,
    config: Arc<JournalConfig>,
}

#[tool_router]
impl FrontmatterTools {
    pub fn new(config: Arc<JournalConfig>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            config,
        }
    }

    /// Extract frontmatter fields across dated entries.
    #[tool(description = "Queries YAML frontmatter fields (e.g. mood, anxiety, weight_kg) across dated journal entries, with optional date range, statistics and csv/table output.")]
    async fn query_frontmatter(
        &self,
        Parameters(params): Parameters<QueryFrontmatterParams>,
    ) -> Result<CallToolResult, McpError> {
        let query = FieldQuery::parse(
            params.fields,
            &self.config.fields.default_fields,
            params.start_date.as_deref(),
            params.end_date.as_deref(),
            params.stats.unwrap_or(false),
            params.format.as_deref(),
        )
        .map_err(|e| to_mcp_error(e, "Frontmatter query"))?;
        tracing::info!(fields = ?query.fields, stats = query.stats, "query_frontmatter called");

        let config = Arc::clone(&self.config);
        let report = tokio::task::spawn_blocking(move || fields::query_fields(&config, &query))
            .await
            .map_err(join_error)?
            .map_err(|e| to_mcp_error(e, "Frontmatter query"))?;

        pretty_json(&report)
    }
}

#[tool_handler]
impl ServerHandler for FrontmatterTools {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Structured queries over journal frontmatter. Use query_frontmatter to pull \
                 fields like mood or weight over a date range, optionally with statistics."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
