//! MCP `query_frontmatter` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `query_frontmatter` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct QueryFrontmatterParams {
    /// Frontmatter keys to extract. Defaults to `fields.default_fields`.
    #[schemars(
        description = "Frontmatter fields to extract, e.g. ['mood', 'anxiety', 'weight_kg']. Defaults to the configured field list."
    )]
    pub fields: Option<Vec<String>>,

    #[schemars(description = "Only include entries dated on or after this day (YYYY-MM-DD).")]
    pub start_date: Option<String>,

    #[schemars(description = "Only include entries dated on or before this day (YYYY-MM-DD).")]
    pub end_date: Option<String>,

    /// Include per-field count/min/max/avg.
    #[schemars(
        description = "If true, include numeric statistics (count, min, max, avg) for each field. Ranges like '4-6' count as their midpoint."
    )]
    pub stats: Option<bool>,

    #[schemars(description = "Output format: 'json' (default), 'csv' or 'table'.")]
    pub format: Option<String>,
}
