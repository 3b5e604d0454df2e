//! Where config layers live and which of them exist on disk.

use super::{
    ConfigLayerSource, DEFAULT_CONFIG_DIR, DEFAULT_CONFIG_FILE, LayeredConfigOptions,
};
use crate::ConfigError;
use directories::UserDirs;
use log::debug;
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// A layer file that exists and has not been seen under another source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct LayerCandidate {
    pub(super) source: ConfigLayerSource,
    pub(super) path: PathBuf,
}

impl LayerCandidate {
    /// Label used as the prefix of schema error paths, e.g. `cwd(/srv/shop/concierge.json5)`.
    pub(super) fn label(&self) -> String {
        format!("{}({})", self.source.as_str(), self.path.display())
    }
}

/// `~/.concierge/concierge.json5`, when a home directory is known.
pub(super) fn default_user_config_path() -> Option<PathBuf> {
    UserDirs::new().map(|dirs| {
        dirs.home_dir()
            .join(DEFAULT_CONFIG_DIR)
            .join(DEFAULT_CONFIG_FILE)
    })
}

/// Existing layer files in precedence order (low to high).
///
/// Order: user, project root, cwd, repo `.concierge/`, then runtime paths.
/// Missing files and paths already claimed by an earlier layer are skipped.
pub(super) fn discover_layers(
    options: &LayeredConfigOptions,
) -> Result<Vec<LayerCandidate>, ConfigError> {
    let cwd = canonical_cwd(&options.cwd)?;
    let project_root = cwd
        .ancestors()
        .find(|dir| {
            options
                .project_root_markers
                .iter()
                .any(|marker| dir.join(marker).exists())
        })
        .map(Path::to_path_buf);
    match project_root.as_ref() {
        Some(root) => debug!("resolved project root (path={})", root.display()),
        None => debug!("no project root found (cwd={})", cwd.display()),
    }

    let mut wanted = Vec::new();
    if let Some(path) = options.user_config_path.clone() {
        wanted.push((ConfigLayerSource::User, path));
    }
    if let Some(root) = project_root.as_ref() {
        wanted.push((ConfigLayerSource::Project, root.join(DEFAULT_CONFIG_FILE)));
    }
    wanted.push((ConfigLayerSource::Cwd, cwd.join(DEFAULT_CONFIG_FILE)));
    if let Some(root) = project_root.as_ref() {
        wanted.push((
            ConfigLayerSource::Repo,
            root.join(DEFAULT_CONFIG_DIR).join(DEFAULT_CONFIG_FILE),
        ));
    }

    let mut seen = HashSet::new();
    let mut layers = Vec::new();
    for (source, path) in wanted {
        if !path.exists() {
            debug!(
                "config layer absent (source={}, path={})",
                source.as_str(),
                path.display()
            );
            continue;
        }
        if seen.insert(dedup_key(&path)) {
            layers.push(LayerCandidate { source, path });
        }
    }
    // Runtime overrides are explicit, so a missing one surfaces as a read error.
    for path in &options.runtime_paths {
        if seen.insert(dedup_key(path)) {
            layers.push(LayerCandidate {
                source: ConfigLayerSource::Runtime,
                path: path.clone(),
            });
        } else {
            debug!("runtime layer already loaded (path={})", path.display());
        }
    }
    Ok(layers)
}

fn canonical_cwd(cwd: &Path) -> Result<PathBuf, ConfigError> {
    match cwd.canonicalize() {
        Ok(path) => Ok(path),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(cwd.to_path_buf()),
        Err(err) => Err(ConfigError::read(cwd, err)),
    }
}

fn dedup_key(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
