//! Structural checks for Concierge JSON5 layers, run before serde decoding.

use crate::ConfigError;
use serde_json::{Map, Value};

/// Expected shape of a config value.
enum Shape {
    Str,
    Count,
    /// Any number, string, bool, or null; decoded leniently later.
    Scalar,
    Strings,
    Section(&'static [(&'static str, Shape)]),
}

const OUTPUT_POLICY: &[(&str, Shape)] = &[
    ("max_string_bytes", Shape::Count),
    ("max_array_len", Shape::Count),
    ("max_object_entries", Shape::Count),
    ("redact_keys", Shape::Strings),
    ("redact_values", Shape::Strings),
    ("replacement", Shape::Str),
];

const ROOT: &[(&str, Shape)] = &[
    ("$schema", Shape::Str),
    (
        "orchestrator",
        Shape::Section(&[
            ("max_search_iterations", Shape::Scalar),
            ("tool_timeout_ms", Shape::Count),
            ("local_domains", Shape::Strings),
            ("system_prompt", Shape::Str),
        ]),
    ),
    (
        "memory",
        Shape::Section(&[
            ("entity_decay_turns", Shape::Count),
            ("default_aliases", Shape::Strings),
        ]),
    ),
    (
        "tools",
        Shape::Section(&[("output_policy", Shape::Section(OUTPUT_POLICY))]),
    ),
    (
        "links",
        Shape::Section(&[("allowed_hosts", Shape::Strings)]),
    ),
];

/// Check a layer (or the merged config). Errors carry `layer:dotted.path`.
pub(super) fn validate_config_schema(value: &Value, layer: &str) -> Result<(), ConfigError> {
    check(value, &Shape::Section(ROOT), layer, "")
}

fn check(value: &Value, shape: &Shape, layer: &str, path: &str) -> Result<(), ConfigError> {
    match shape {
        Shape::Str if value.is_string() => Ok(()),
        Shape::Str => Err(invalid_field(layer, path, "expected string")),
        Shape::Count if value.is_u64() => Ok(()),
        Shape::Count => Err(invalid_field(layer, path, "expected non-negative integer")),
        Shape::Scalar if value.is_array() || value.is_object() => {
            Err(invalid_field(layer, path, "expected scalar"))
        }
        Shape::Scalar => Ok(()),
        Shape::Strings => {
            let Value::Array(entries) = value else {
                return Err(invalid_field(layer, path, "expected array"));
            };
            match entries.iter().position(|entry| !entry.is_string()) {
                Some(index) => Err(invalid_field(
                    layer,
                    &format!("{path}[{index}]"),
                    "expected string",
                )),
                None => Ok(()),
            }
        }
        Shape::Section(fields) => {
            let Value::Object(map) = value else {
                return Err(invalid_field(layer, path, "expected object"));
            };
            check_section(map, fields, layer, path)
        }
    }
}

fn check_section(
    map: &Map<String, Value>,
    fields: &[(&str, Shape)],
    layer: &str,
    path: &str,
) -> Result<(), ConfigError> {
    for (key, value) in map {
        let child = if path.is_empty() {
            key.clone()
        } else {
            format!("{path}.{key}")
        };
        match fields.iter().find(|(name, _)| *name == key.as_str()) {
            Some((_, shape)) => check(value, shape, layer, &child)?,
            None => return Err(invalid_field(layer, &child, "unknown key")),
        }
    }
    Ok(())
}

fn invalid_field(layer: &str, path: &str, message: &str) -> ConfigError {
    let path = if path.is_empty() { "root" } else { path };
    ConfigError::InvalidField {
        path: format!("{layer}:{path}"),
        message: message.to_string(),
    }
}
