//! Configuration schema for Concierge.

use log::warn;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Root config for a Concierge deployment.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConciergeConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub links: LinksConfig,
}

impl ConciergeConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> ConciergeConfigBuilder {
        ConciergeConfigBuilder::new()
    }
}

/// Builder for assembling a `ConciergeConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct ConciergeConfigBuilder {
    config: ConciergeConfig,
}

impl ConciergeConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: ConciergeConfig::default(),
        }
    }

    /// Replace the orchestrator configuration.
    pub fn orchestrator(mut self, orchestrator: OrchestratorConfig) -> Self {
        self.config.orchestrator = orchestrator;
        self
    }

    /// Set only the search iteration bound, keeping other orchestrator settings.
    pub fn max_search_iterations(mut self, max_search_iterations: i64) -> Self {
        self.config.orchestrator.max_search_iterations = max_search_iterations;
        self
    }

    /// Replace the conversation memory configuration.
    pub fn memory(mut self, memory: MemoryConfig) -> Self {
        self.config.memory = memory;
        self
    }

    /// Replace the tool configuration.
    pub fn tools(mut self, tools: ToolsConfig) -> Self {
        self.config.tools = tools;
        self
    }

    /// Replace the outbound link configuration.
    pub fn links(mut self, links: LinksConfig) -> Self {
        self.config.links = links;
        self
    }

    /// Finalize and return the built `ConciergeConfig`.
    pub fn build(self) -> ConciergeConfig {
        self.config
    }
}

/// Reasoning-loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Maximum number of tool rounds per turn. Stored raw; read through
    /// [`OrchestratorConfig::effective_max_search_iterations`].
    #[serde(
        default = "default_max_search_iterations",
        deserialize_with = "deserialize_iteration_bound"
    )]
    pub max_search_iterations: i64,
    #[serde(default = "default_tool_timeout_ms")]
    pub tool_timeout_ms: u64,
    /// Hosts treated as local/test deployments (link sanitization is skipped).
    #[serde(default = "default_local_domains")]
    pub local_domains: Vec<String>,
    /// Replacement for the built-in base instructions.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_search_iterations: default_max_search_iterations(),
            tool_timeout_ms: default_tool_timeout_ms(),
            local_domains: default_local_domains(),
            system_prompt: None,
        }
    }
}

impl OrchestratorConfig {
    /// Iteration bound clamped to a minimum of zero.
    pub fn effective_max_search_iterations(&self) -> u32 {
        if self.max_search_iterations < 0 {
            warn!(
                "negative max_search_iterations clamped to 0 (configured={})",
                self.max_search_iterations
            );
            return 0;
        }
        u32::try_from(self.max_search_iterations).unwrap_or(u32::MAX)
    }

    /// Per tool call deadline.
    pub fn tool_timeout(&self) -> Duration {
        Duration::from_millis(self.tool_timeout_ms)
    }

    /// Whether a domain is a local or test host.
    pub fn is_local_domain(&self, domain: &str) -> bool {
        let host = host_of(domain);
        if host.is_empty() {
            return false;
        }
        if self
            .local_domains
            .iter()
            .any(|local| local.eq_ignore_ascii_case(&host))
        {
            return true;
        }
        [".localhost", ".local", ".test"]
            .iter()
            .any(|suffix| host.ends_with(suffix))
    }
}

/// Strip scheme, path, and port from a domain string and lowercase it.
fn host_of(domain: &str) -> String {
    let trimmed = domain.trim().to_ascii_lowercase();
    let without_scheme = trimmed
        .split_once("://")
        .map(|(_, rest)| rest.to_string())
        .unwrap_or(trimmed);
    let authority = without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    if let Some(bracketed) = authority.strip_prefix('[') {
        return bracketed.split(']').next().unwrap_or_default().to_string();
    }
    if authority.matches(':').count() > 1 {
        return authority.to_string();
    }
    authority.split(':').next().unwrap_or_default().to_string()
}

fn default_max_search_iterations() -> i64 {
    3
}

fn default_tool_timeout_ms() -> u64 {
    10_000
}

fn default_local_domains() -> Vec<String> {
    ["localhost", "127.0.0.1", "0.0.0.0", "::1"]
        .iter()
        .map(|domain| domain.to_string())
        .collect()
}

/// Decode the iteration bound leniently; invalid values fall back to the default.
fn deserialize_iteration_bound<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(iteration_bound_from_value(&value))
}

/// Interpret a JSON value as an iteration bound.
pub fn iteration_bound_from_value(value: &Value) -> i64 {
    let parsed = match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|float| float.is_finite())
                .map(|float| float.trunc() as i64)
        }),
        Value::String(text) => {
            let text = text.trim();
            text.parse::<i64>().ok().or_else(|| {
                text.parse::<f64>()
                    .ok()
                    .filter(|float| float.is_finite())
                    .map(|float| float.trunc() as i64)
            })
        }
        _ => None,
    };
    parsed.unwrap_or_else(|| {
        warn!("invalid max_search_iterations ignored (value={value})");
        default_max_search_iterations()
    })
}

/// Conversation memory configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Entities older than this many turns drop out of the context summary.
    #[serde(default = "default_entity_decay_turns")]
    pub entity_decay_turns: u32,
    /// Aliases attached to every extracted entity.
    #[serde(default = "default_aliases")]
    pub default_aliases: Vec<String>,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            entity_decay_turns: default_entity_decay_turns(),
            default_aliases: default_aliases(),
        }
    }
}

fn default_entity_decay_turns() -> u32 {
    5
}

fn default_aliases() -> Vec<String> {
    ["it", "that", "this"]
        .iter()
        .map(|alias| alias.to_string())
        .collect()
}

/// Global tool configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ToolsConfig {
    #[serde(default)]
    pub output_policy: ToolOutputPolicyConfig,
}

/// Output policy for tool results folded back into the model context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutputPolicyConfig {
    #[serde(default = "default_max_string_bytes")]
    pub max_string_bytes: usize,
    #[serde(default = "default_max_array_len")]
    pub max_array_len: usize,
    #[serde(default = "default_max_object_entries")]
    pub max_object_entries: usize,
    #[serde(default)]
    pub redact_keys: Vec<String>,
    #[serde(default)]
    pub redact_values: Vec<String>,
    #[serde(default = "default_redaction_replacement")]
    pub replacement: String,
}

impl Default for ToolOutputPolicyConfig {
    fn default() -> Self {
        Self {
            max_string_bytes: default_max_string_bytes(),
            max_array_len: default_max_array_len(),
            max_object_entries: default_max_object_entries(),
            redact_keys: Vec::new(),
            redact_values: Vec::new(),
            replacement: default_redaction_replacement(),
        }
    }
}

/// Default maximum string size for tool output in bytes.
fn default_max_string_bytes() -> usize {
    8 * 1024
}

/// Default maximum array length for tool output.
fn default_max_array_len() -> usize {
    20
}

/// Default maximum object entry count for tool output.
fn default_max_object_entries() -> usize {
    64
}

/// Default replacement marker for redacted fields.
fn default_redaction_replacement() -> String {
    "[REDACTED]".to_string()
}

/// Outbound link policy for delivered responses.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LinksConfig {
    /// Hosts whose links are kept; empty keeps every link.
    #[serde(default)]
    pub allowed_hosts: Vec<String>,
}
