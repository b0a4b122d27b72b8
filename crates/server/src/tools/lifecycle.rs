//! agent_install and agent_activate tool implementations.

use std::sync::Arc;

use rmcp::{ErrorData as McpError, model::CallToolResult};
use swcache_client::{AgentEvent, CacheAgent, EventOutcome, Network};

use super::json_result;
use crate::error::ToolError;

/// Deliver an event and wait for its task to finish.
async fn run<N: Network + 'static>(agent: &Arc<CacheAgent<N>>, event: AgentEvent) -> Result<EventOutcome, McpError> {
    let outcome = agent.dispatch(event).await.map_err(ToolError::from)??;
    Ok(outcome)
}

/// Implementation of the agent_install tool.
pub async fn install_impl<N: Network + 'static>(agent: &Arc<CacheAgent<N>>) -> Result<CallToolResult, McpError> {
    match run(agent, AgentEvent::Install).await? {
        EventOutcome::Installed(report) => json_result(&report),
        other => Err(ToolError::TaskFailed(format!("unexpected outcome: {other:?}")).into()),
    }
}

/// Implementation of the agent_activate tool.
pub async fn activate_impl<N: Network + 'static>(agent: &Arc<CacheAgent<N>>) -> Result<CallToolResult, McpError> {
    match run(agent, AgentEvent::Activate).await? {
        EventOutcome::Activated(report) => json_result(&report),
        other => Err(ToolError::TaskFailed(format!("unexpected outcome: {other:?}")).into()),
    }
}
