//! [`Telemetry`] sink that forwards to the `log` facade.

use concierge_rs_protocol::{LogLevel, SearchLogEntry, Telemetry};
use log::{debug, error, info, warn};
use serde_json::Value;

/// Writes telemetry as log lines so a host without a metrics backend still sees turns.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTelemetry;

impl Telemetry for LogTelemetry {
    fn log(&self, level: LogLevel, channel: &str, message: &str, fields: &Value) {
        match level {
            LogLevel::Debug => debug!("{message} (channel={channel}, fields={fields})"),
            LogLevel::Info => info!("{message} (channel={channel}, fields={fields})"),
            LogLevel::Warn => warn!("{message} (channel={channel}, fields={fields})"),
            LogLevel::Error => error!("{message} (channel={channel}, fields={fields})"),
        }
    }

    fn track_iteration(&self, iteration: u32, tool_call_count: usize) {
        debug!("reasoning iteration (iteration={iteration}, tool_calls={tool_call_count})");
    }

    fn track_search(&self, entry: &SearchLogEntry) {
        debug!(
            "tool search (tool={}, query={}, result_count={}, source={})",
            entry.tool, entry.query, entry.result_count, entry.source
        );
    }
}
