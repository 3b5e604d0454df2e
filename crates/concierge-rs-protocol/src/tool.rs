//! Tool execution results and error types.

use crate::ToolCall;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Errors returned by tools and tool adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolError {
    /// Tool name was not found in registry.
    #[error("tool not found: {0}")]
    ToolNotFound(String),
    /// Tool received invalid arguments.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    /// Tool execution failed.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),
    /// Tool did not finish within its deadline.
    #[error("timed out after {0}ms")]
    Timeout(u64),
}

impl ToolError {
    /// Failure category recorded in a tool outcome.
    pub fn kind(&self) -> ToolFailureKind {
        match self {
            ToolError::ToolNotFound(_) => ToolFailureKind::NotFound,
            ToolError::InvalidArguments(_) => ToolFailureKind::InvalidArguments,
            ToolError::ExecutionFailed(_) => ToolFailureKind::Execution,
            ToolError::Timeout(_) => ToolFailureKind::Timeout,
        }
    }
}

/// A single search/lookup hit returned by a tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SearchResult {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub metadata: Value,
}

/// Structured commerce product surfaced by a tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Product {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Why a tool call failed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ToolFailureKind {
    Timeout,
    NotFound,
    InvalidArguments,
    Execution,
}

impl fmt::Display for ToolFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ToolFailureKind::Timeout => "timeout",
            ToolFailureKind::NotFound => "not_found",
            ToolFailureKind::InvalidArguments => "invalid_arguments",
            ToolFailureKind::Execution => "execution",
        };
        f.write_str(label)
    }
}

/// Outcome of a single tool call. Failures are values, never errors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum ToolOutcome {
    Success {
        results: Vec<SearchResult>,
        source: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        products: Vec<Product>,
    },
    Failure {
        kind: ToolFailureKind,
        message: String,
    },
}

impl ToolOutcome {
    pub fn success(source: impl Into<String>, results: Vec<SearchResult>) -> Self {
        ToolOutcome::Success {
            results,
            source: source.into(),
            products: Vec::new(),
        }
    }

    pub fn failure(kind: ToolFailureKind, message: impl Into<String>) -> Self {
        ToolOutcome::Failure {
            kind,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ToolOutcome::Success { .. })
    }

    /// Number of result items; zero for failures.
    pub fn result_count(&self) -> usize {
        match self {
            ToolOutcome::Success { results, .. } => results.len(),
            ToolOutcome::Failure { .. } => 0,
        }
    }

    /// Source label used in the search log.
    pub fn source(&self) -> String {
        match self {
            ToolOutcome::Success { source, .. } => source.clone(),
            ToolOutcome::Failure { kind, .. } => format!("error:{kind}"),
        }
    }
}

impl From<ToolError> for ToolOutcome {
    fn from(err: ToolError) -> Self {
        ToolOutcome::failure(err.kind(), err.to_string())
    }
}

/// Result of executing one tool call from a reasoning round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolExecutionResult {
    /// The call as issued by the model.
    pub tool_call: ToolCall,
    pub tool_name: String,
    /// Parsed arguments (`null` when they could not be parsed).
    pub tool_args: Value,
    pub outcome: ToolOutcome,
    /// Wall-clock execution time in milliseconds.
    pub execution_time_ms: u64,
}

impl ToolExecutionResult {
    /// Build a result for a call, parsing its arguments leniently.
    pub fn new(tool_call: ToolCall, outcome: ToolOutcome, execution_time_ms: u64) -> Self {
        let tool_args = tool_call.parsed_arguments().unwrap_or(Value::Null);
        Self {
            tool_name: tool_call.name.clone(),
            tool_call,
            tool_args,
            outcome,
            execution_time_ms,
        }
    }

    /// Search query carried in the arguments, falling back to the raw argument string.
    pub fn query(&self) -> String {
        for key in ["query", "q", "search", "sku", "order_number"] {
            if let Some(value) = self.tool_args.get(key).and_then(Value::as_str) {
                return value.to_string();
            }
        }
        self.tool_call.arguments.clone()
    }
}
