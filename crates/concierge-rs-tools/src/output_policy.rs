//! Redaction and truncation of tool output before it reaches the model.

use concierge_rs_config::ToolOutputPolicyConfig;
use serde_json::Value;

/// Suffix appended to strings cut at `max_string_bytes`.
const TRUNCATION_MARKER: &str = "…";

/// Policy that redacts and truncates tool outputs folded into model context.
#[derive(Debug, Clone)]
pub struct ToolOutputPolicy {
    /// Maximum size of string fields in bytes (marker included).
    pub max_string_bytes: usize,
    /// Maximum number of elements kept from arrays.
    pub max_array_len: usize,
    /// Maximum number of object entries kept.
    pub max_object_entries: usize,
    /// Key names whose values are replaced wholesale.
    pub redact_keys: Vec<String>,
    /// Substrings that cause a string value to be replaced.
    pub redact_values: Vec<String>,
    /// Replacement text for redacted values.
    pub replacement: String,
}

impl Default for ToolOutputPolicy {
    fn default() -> Self {
        Self::from(&ToolOutputPolicyConfig::default())
    }
}

impl From<&ToolOutputPolicyConfig> for ToolOutputPolicy {
    fn from(config: &ToolOutputPolicyConfig) -> Self {
        Self {
            max_string_bytes: config.max_string_bytes,
            max_array_len: config.max_array_len,
            max_object_entries: config.max_object_entries,
            redact_keys: config.redact_keys.clone(),
            redact_values: config.redact_values.clone(),
            replacement: config.replacement.clone(),
        }
    }
}

impl ToolOutputPolicy {
    /// Apply the policy to a JSON value.
    pub fn apply(&self, value: Value) -> Value {
        match value {
            Value::String(value) => Value::String(self.apply_string(value)),
            Value::Array(values) => Value::Array(
                values
                    .into_iter()
                    .take(self.max_array_len)
                    .map(|value| self.apply(value))
                    .collect(),
            ),
            Value::Object(values) => {
                let mut trimmed =
                    serde_json::Map::with_capacity(values.len().min(self.max_object_entries));
                for (key, value) in values.into_iter().take(self.max_object_entries) {
                    let value = if self.should_redact_key(&key) {
                        Value::String(self.replacement.clone())
                    } else {
                        self.apply(value)
                    };
                    trimmed.insert(key, value);
                }
                Value::Object(trimmed)
            }
            value => value,
        }
    }

    /// Apply the policy and serialize the result as compact JSON.
    pub fn render(&self, value: Value) -> String {
        self.apply(value).to_string()
    }

    /// Apply redaction and truncation to free text.
    pub fn apply_text(&self, value: &str) -> String {
        self.apply_string(value.to_string())
    }

    fn apply_string(&self, value: String) -> String {
        if self.should_redact_value(&value) {
            return self.replacement.clone();
        }
        self.truncate_string(value)
    }

    fn should_redact_key(&self, key: &str) -> bool {
        self.redact_keys
            .iter()
            .any(|entry| entry.eq_ignore_ascii_case(key))
    }

    fn should_redact_value(&self, value: &str) -> bool {
        if self.redact_values.is_empty() {
            return false;
        }
        let lowered = value.to_lowercase();
        self.redact_values
            .iter()
            .filter(|entry| !entry.is_empty())
            .any(|entry| lowered.contains(&entry.to_lowercase()))
    }

    /// Cut a string on a char boundary so that it, plus the marker, fits.
    fn truncate_string(&self, value: String) -> String {
        let max_bytes = self.max_string_bytes;
        if value.len() <= max_bytes {
            return value;
        }
        if max_bytes < TRUNCATION_MARKER.len() {
            return String::new();
        }
        let budget = max_bytes - TRUNCATION_MARKER.len();
        let end = value
            .char_indices()
            .map(|(idx, ch)| idx + ch.len_utf8())
            .take_while(|next| *next <= budget)
            .last()
            .unwrap_or(0);
        format!("{}{TRUNCATION_MARKER}", &value[..end])
    }
}
