use async_trait::async_trait;
use concierge_rs_protocol::{Telemetry, ToolCall, ToolExecutionResult};
use concierge_rs_tools::ToolExecutor;
use std::sync::Arc;
use std::time::Duration;

/// Wraps an executor and reports its results in reverse, dropping listed call ids.
///
/// Simulates an executor that returns results in completion order.
pub struct ReorderingExecutor {
    inner: Arc<dyn ToolExecutor>,
    dropped: Vec<String>,
}

impl ReorderingExecutor {
    pub fn new(inner: Arc<dyn ToolExecutor>) -> Self {
        Self {
            inner,
            dropped: Vec::new(),
        }
    }

    pub fn dropping(mut self, call_id: impl Into<String>) -> Self {
        self.dropped.push(call_id.into());
        self
    }
}

#[async_trait]
impl ToolExecutor for ReorderingExecutor {
    async fn execute_parallel(
        &self,
        calls: &[ToolCall],
        domain: &str,
        timeout: Duration,
        telemetry: Option<&dyn Telemetry>,
    ) -> Vec<ToolExecutionResult> {
        let mut results = self
            .inner
            .execute_parallel(calls, domain, timeout, telemetry)
            .await;
        results.retain(|result| !self.dropped.contains(&result.tool_call.id));
        results.reverse();
        results
    }
}
