//! MCP `search_clips` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `search_clips` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SearchClipsParams {
    /// Search query. Keyword mode passes FTS5 syntax through (AND/OR,
    /// "quoted phrases", prefix*).
    #[schemars(description = "Search query. Keyword mode supports FTS5 syntax: AND/OR, \"quoted phrases\", prefix*.")]
    pub query: String,

    /// If `true`, rank by embedding similarity instead of keyword match.
    #[schemars(description = "If true, rank by embedding similarity instead of keyword match.")]
    pub semantic: Option<bool>,

    /// Filter by source application name.
    #[schemars(description = "Filter by source application name (case-insensitive).")]
    pub app: Option<String>,

    /// Filter by tag.
    #[schemars(description = "Filter by tag name.")]
    pub tag: Option<String>,

    /// Only clips created at or after this ISO 8601 timestamp.
    #[schemars(description = "Only clips created at or after this ISO 8601 timestamp.")]
    pub since: Option<String>,

    /// Only clips created before this ISO 8601 timestamp.
    #[schemars(description = "Only clips created before this ISO 8601 timestamp.")]
    pub until: Option<String>,

    /// Only pinned clips.
    #[schemars(description = "If true, only pinned clips.")]
    pub pinned: Option<bool>,

    /// Maximum results to return. Defaults to 10.
    #[schemars(description = "Maximum number of results. Defaults to 10.")]
    pub limit: Option<usize>,
}
