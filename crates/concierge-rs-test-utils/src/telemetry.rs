use concierge_rs_protocol::{LogLevel, SearchLogEntry, Telemetry};
use parking_lot::Mutex;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct LoggedLine {
    pub level: LogLevel,
    pub channel: String,
    pub message: String,
    pub fields: Value,
}

/// Captures every telemetry call for assertions.
#[derive(Debug, Default)]
pub struct RecordingTelemetry {
    lines: Mutex<Vec<LoggedLine>>,
    iterations: Mutex<Vec<(u32, usize)>>,
    searches: Mutex<Vec<SearchLogEntry>>,
}

impl RecordingTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<LoggedLine> {
        self.lines.lock().clone()
    }

    pub fn iterations(&self) -> Vec<(u32, usize)> {
        self.iterations.lock().clone()
    }

    pub fn searches(&self) -> Vec<SearchLogEntry> {
        self.searches.lock().clone()
    }
}

impl Telemetry for RecordingTelemetry {
    fn log(&self, level: LogLevel, channel: &str, message: &str, fields: &Value) {
        self.lines.lock().push(LoggedLine {
            level,
            channel: channel.to_string(),
            message: message.to_string(),
            fields: fields.clone(),
        });
    }

    fn track_iteration(&self, iteration: u32, tool_call_count: usize) {
        self.iterations.lock().push((iteration, tool_call_count));
    }

    fn track_search(&self, entry: &SearchLogEntry) {
        self.searches.lock().push(entry.clone());
    }
}
