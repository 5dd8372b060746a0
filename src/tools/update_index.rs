//! MCP `update_index` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `update_index` MCP tool.
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct UpdateIndexParams {
    #[schemars(
        description = "Whether to reindex all journal entries (true) or only new/modified ones (false). Defaults to false."
    )]
    pub full_reindex: Option<bool>,
}
