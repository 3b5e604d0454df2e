//! Layered `concierge.json5` loading.
//!
//! A storefront deployment usually carries a user-wide file, a project file,
//! and per-environment runtime overrides. Layers are schema-checked one by one,
//! deep-merged in precedence order, and decoded into [`ConciergeConfig`].

mod discovery;
mod merge;
mod schema;


use crate::{ConciergeConfig, ConfigError};
use log::{debug, info};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "concierge.json5";
const DEFAULT_CONFIG_DIR: &str = ".concierge";
const DEFAULT_PROJECT_ROOT_MARKERS: &[&str] = &[".git"];

/// Merged config and the files it came from, lowest precedence first.
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub config: ConciergeConfig,
    pub layers: Vec<ConfigLayer>,
}

/// Where a layer file was found. Later variants override earlier ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayerSource {
    /// `~/.concierge/concierge.json5`.
    User,
    /// `concierge.json5` at the project root.
    Project,
    Cwd,
    /// `.concierge/concierge.json5` under the project root.
    Repo,
    /// Paths passed explicitly by the host.
    Runtime,
}

impl ConfigLayerSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigLayerSource::User => "user",
            ConfigLayerSource::Project => "project",
            ConfigLayerSource::Cwd => "cwd",
            ConfigLayerSource::Repo => "repo",
            ConfigLayerSource::Runtime => "runtime",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLayer {
    pub source: ConfigLayerSource,
    pub path: PathBuf,
}

/// Knobs for layer discovery.
#[derive(Debug, Clone)]
pub struct LayeredConfigOptions {
    pub cwd: PathBuf,
    /// `None` disables the user layer.
    pub user_config_path: Option<PathBuf>,
    /// Applied last, in order; each must exist.
    pub runtime_paths: Vec<PathBuf>,
    /// Entries whose presence marks the project root while walking up from `cwd`.
    pub project_root_markers: Vec<String>,
}

impl LayeredConfigOptions {
    pub fn new(cwd: impl AsRef<Path>) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
            user_config_path: discovery::default_user_config_path(),
            runtime_paths: Vec::new(),
            project_root_markers: DEFAULT_PROJECT_ROOT_MARKERS
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }

    pub fn with_runtime_path(mut self, path: impl AsRef<Path>) -> Self {
        self.runtime_paths.push(path.as_ref().to_path_buf());
        self
    }
}

impl ConciergeConfig {
    /// Load a single config from a path (no layering).
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!("loading config (path={})", path.display());
        let contents = fs::read_to_string(path).map_err(|err| ConfigError::read(path, err))?;
        let value: Value = json5::from_str(&contents)
            .map_err(|err| ConfigError::parse(path.display().to_string(), err))?;
        config_from_value(value, "config")
    }

    /// Load a single config from JSON5 contents (no layering).
    pub fn load_from_str(contents: &str) -> Result<Self, ConfigError> {
        debug!("loading config from string (len={})", contents.len());
        let value: Value =
            json5::from_str(contents).map_err(|err| ConfigError::parse("config", err))?;
        config_from_value(value, "config")
    }

    /// Load a layered config stack using the default layer locations.
    pub fn load_layered(cwd: impl AsRef<Path>) -> Result<LayeredConfig, ConfigError> {
        Self::load_layered_with_options(LayeredConfigOptions::new(cwd))
    }

    /// Load a layered config stack using explicit layer locations and overrides.
    ///
    /// Layer precedence (low -> high): user, project, cwd, repo, runtime overrides.
    /// Each layer is schema-checked on its own before merging, so errors name the file.
    pub fn load_layered_with_options(
        options: LayeredConfigOptions,
    ) -> Result<LayeredConfig, ConfigError> {
        let candidates = discovery::discover_layers(&options)?;
        let mut merged = Value::Object(serde_json::Map::new());
        let mut layers = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let label = candidate.label();
            debug!("reading config layer ({label})");
            let contents = fs::read_to_string(&candidate.path)
                .map_err(|err| ConfigError::read(&candidate.path, err))?;
            let value: Value =
                json5::from_str(&contents).map_err(|err| ConfigError::parse(&label, err))?;
            schema::validate_config_schema(&value, &label)?;
            merge::merge_json_values(&mut merged, &value);
            layers.push(ConfigLayer {
                source: candidate.source,
                path: candidate.path,
            });
        }

        let config = config_from_value(merged, "effective")?;
        info!("layered config loaded (layers={})", layers.len());
        Ok(LayeredConfig { config, layers })
    }
}

fn config_from_value(value: Value, label: &str) -> Result<ConciergeConfig, ConfigError> {
    schema::validate_config_schema(&value, label)?;
    let config: ConciergeConfig = serde_json::from_value(value)?;
    config.validate()?;
    Ok(config)
}

impl ConciergeConfig {
    /// Validate configuration invariants that cannot be expressed in serde.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.orchestrator.tool_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "orchestrator.tool_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self
            .memory
            .default_aliases
            .iter()
            .any(|alias| alias.trim().is_empty())
        {
            return Err(ConfigError::Invalid(
                "memory.default_aliases must not contain blank entries".to_string(),
            ));
        }
        Ok(())
    }
}
