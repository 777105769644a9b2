//! MCP `recent_clips` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `recent_clips` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RecentClipsParams {
    /// Filter by source application name.
    #[schemars(description = "Filter by source application name (case-insensitive).")]
    pub app: Option<String>,

    /// Filter by tag.
    #[schemars(description = "Filter by tag name.")]
    pub tag: Option<String>,

    /// Substring the content must contain.
    #[schemars(description = "Substring the clip content must contain.")]
    pub contains: Option<String>,

    /// Only pinned clips.
    #[schemars(description = "If true, only pinned clips.")]
    pub pinned: Option<bool>,

    /// Maximum results to return. Defaults to 10.
    #[schemars(description = "Maximum number of results. Defaults to 10.")]
    pub limit: Option<usize>,
}
