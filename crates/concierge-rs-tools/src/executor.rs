//! Concurrent execution of one round of tool calls.

use crate::context::ToolContext;
use crate::registry::ToolRegistry;
use async_trait::async_trait;
use concierge_rs_protocol::{
    LogLevel, Telemetry, ToolCall, ToolError, ToolExecutionResult, ToolOutcome,
};
use futures_util::future::join_all;
use log::{debug, warn};
use serde_json::json;
use std::time::{Duration, Instant};

/// Executes every tool call of a reasoning round.
///
/// Implementations never fail: each call settles into a [`ToolExecutionResult`]
/// whose outcome is either a success or a structured failure.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute_parallel(
        &self,
        calls: &[ToolCall],
        domain: &str,
        timeout: Duration,
        telemetry: Option<&dyn Telemetry>,
    ) -> Vec<ToolExecutionResult>;
}

/// Default executor: fans calls out over a [`ToolRegistry`] and waits for all.
#[derive(Clone, Default)]
pub struct ParallelToolExecutor {
    registry: ToolRegistry,
}

impl ParallelToolExecutor {
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    async fn execute_one(
        &self,
        call: &ToolCall,
        domain: &str,
        timeout: Duration,
    ) -> ToolExecutionResult {
        let started = Instant::now();
        let outcome = match self.invoke(call, domain, timeout).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(
                    "tool call failed (tool={}, call_id={}, error={})",
                    call.name, call.id, err
                );
                ToolOutcome::from(err)
            }
        };
        let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        ToolExecutionResult::new(call.clone(), outcome, elapsed)
    }

    async fn invoke(
        &self,
        call: &ToolCall,
        domain: &str,
        timeout: Duration,
    ) -> Result<ToolOutcome, ToolError> {
        let tool = self
            .registry
            .get(&call.name)
            .ok_or_else(|| ToolError::ToolNotFound(call.name.clone()))?;
        let args = call.parsed_arguments()?;
        if !tool.supports_parallel() {
            debug!(
                "tool prefers sequential execution; running in batch (tool={})",
                call.name
            );
        }
        let ctx = ToolContext::new(domain, &call.id, &call.name, timeout);
        match tokio::time::timeout(timeout, tool.call(&ctx, args)).await {
            Ok(output) => output.map(|output| output.into_outcome()),
            Err(_) => Err(ToolError::Timeout(
                u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            )),
        }
    }
}

#[async_trait]
impl ToolExecutor for ParallelToolExecutor {
    async fn execute_parallel(
        &self,
        calls: &[ToolCall],
        domain: &str,
        timeout: Duration,
        telemetry: Option<&dyn Telemetry>,
    ) -> Vec<ToolExecutionResult> {
        debug!(
            "executing tool batch (domain={}, calls={}, timeout_ms={})",
            domain,
            calls.len(),
            timeout.as_millis()
        );
        let results = join_all(
            calls
                .iter()
                .map(|call| self.execute_one(call, domain, timeout)),
        )
        .await;

        if let Some(telemetry) = telemetry {
            for result in &results {
                telemetry.log(
                    LogLevel::Debug,
                    "tools",
                    "Tool executed",
                    &json!({
                        "tool": result.tool_name,
                        "tool_call_id": result.tool_call.id,
                        "success": result.outcome.is_success(),
                        "execution_time_ms": result.execution_time_ms,
                    }),
                );
            }
        }
        results
    }
}
