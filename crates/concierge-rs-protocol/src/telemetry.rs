//! Telemetry sink consumed by the reasoning loop and tool executors.

use crate::SearchLogEntry;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Severity attached to telemetry log lines.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Optional sink for turn telemetry. Every method defaults to a no-op.
pub trait Telemetry: Send + Sync {
    /// Record a structured log line on a channel (e.g. `"ai"`, `"tools"`).
    fn log(&self, level: LogLevel, channel: &str, message: &str, fields: &Value) {
        let _ = (level, channel, message, fields);
    }

    /// Record one completed reasoning iteration.
    fn track_iteration(&self, iteration: u32, tool_call_count: usize) {
        let _ = (iteration, tool_call_count);
    }

    /// Record one executed tool call.
    fn track_search(&self, entry: &SearchLogEntry) {
        let _ = entry;
    }
}
