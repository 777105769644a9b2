//! MCP `clip_status` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `clip_status` MCP tool. Takes no arguments; the struct
/// exists so the tool schema stays explicit.
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct ClipStatusParams {}
