//! MCP `ingest_text` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `ingest_text` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct IngestTextParams {
    /// The text to store. Goes through the same gate as clipboard captures:
    /// size limit, secret filtering, hash dedup.
    #[schemars(description = "Text to store. Subject to the same classification and dedup as clipboard captures.")]
    pub content: String,

    /// Source label recorded instead of an application name. Defaults to "mcp".
    #[schemars(description = "Source label recorded for this clip. Defaults to 'mcp'.")]
    pub source: Option<String>,

    /// Tags to attach after storing.
    #[schemars(description = "Tags to attach to the stored clip.")]
    pub tags: Option<Vec<String>>,
}
