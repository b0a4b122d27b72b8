//! MCP tool implementations.
//!
//! Each tool delivers one event to the caching agent or inspects its cache
//! store. Implementations are generic over the network so they can be
//! exercised without a live site.

pub mod cache;
pub mod lifecycle;
pub mod site_fetch;

#[cfg(test)]
pub(crate) mod fixtures;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

use crate::error::ToolError;

/// Render a tool output as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output).map_err(ToolError::from)?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
