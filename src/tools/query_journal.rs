//! MCP `query_journal` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `query_journal` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct QueryJournalParams {
    /// Natural language search text.
    #[schemars(description = "The search query text.")]
    pub query: String,

    /// Number of entries to return. Defaults to `retrieval.default_n_results`.
    #[schemars(
        description = "Number of journal entries to return (at least 1). Each result is a different entry. Defaults to 10."
    )]
    pub n_results: Option<i64>,
}
