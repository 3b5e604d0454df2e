//! Tool execution context.

use std::time::Duration;

/// Per-invocation context passed to tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolContext {
    /// Storefront domain the turn is running for.
    pub domain: String,
    /// Provider-assigned id of the call being executed.
    pub tool_call_id: String,
    pub tool_name: String,
    /// Deadline enforced by the executor.
    pub timeout: Duration,
}

impl ToolContext {
    pub fn new(
        domain: impl Into<String>,
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            domain: domain.into(),
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            timeout,
        }
    }
}
