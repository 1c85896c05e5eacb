//! Loading and validating cmt's two config files (spec.md §4.1, §6).

use std::path::{Path, PathBuf};

use crate::error::{CmtError, CmtResult};

use super::types::{CmtConfig, HostConfig};

/// Load the root cmt config from `path`.
///
/// Rejects an empty `basePath` or empty `hosts`. Resolves a relative
/// `basePath` against the config file's directory, producing an absolute
/// path (spec.md §4.1).
pub fn load_cmt_config(path: &Path) -> CmtResult<CmtConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| CmtError::Config(format!("failed to read {}: {e}", path.display())))?;
    let mut config: CmtConfig = serde_yaml_ng::from_str(&raw)?;

    if config.base_path.as_os_str().is_empty() {
        return Err(CmtError::Config("basePath must not be empty".into()));
    }
    if config.hosts.is_empty() {
        return Err(CmtError::Config("hosts must not be empty".into()));
    }

    config.base_path = resolve_base_path(path, &config.base_path);
    Ok(config)
}

fn resolve_base_path(config_path: &Path, base_path: &Path) -> PathBuf {
    if base_path.is_absolute() {
        return base_path.to_path_buf();
    }
    let config_dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    config_dir.join(base_path)
}

/// Load `hosts/<name>/host.yml`. Absence of the file is not an error — it
/// simply means there is no host-layer config (spec.md §4.1).
pub fn load_host_config(base_path: &Path, host_name: &str) -> CmtResult<Option<HostConfig>> {
    let path = host_dir(base_path, host_name).join("host.yml");
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(&path)
        .map_err(|e| CmtError::Config(format!("failed to read {}: {e}", path.display())))?;
    let parsed: HostConfig = serde_yaml_ng::from_str(&raw)?;
    Ok(Some(parsed))
}

/// `<basePath>/hosts/<name>/`
pub fn host_dir(base_path: &Path, host_name: &str) -> PathBuf {
    base_path.join("hosts").join(host_name)
}

/// `<basePath>/hosts/<host>/<project>/`
pub fn host_project_dir(base_path: &Path, host_name: &str, project: &str) -> PathBuf {
    host_dir(base_path, host_name).join(project)
}

/// `<basePath>/projects/<project>/`
pub fn project_dir(base_path: &Path, project: &str) -> PathBuf {
    base_path.join("projects").join(project)
}

/// Discover project names for a host: the union of
/// `projects/*` and any projects named in `host.yml`, sorted lexicographically
/// (spec.md §9 — "adopt sorted order explicitly to satisfy P2").
pub fn discover_projects(base_path: &Path, host_config: Option<&HostConfig>) -> Vec<String> {
    let mut names = std::collections::BTreeSet::new();

    let projects_root = base_path.join("projects");
    if let Ok(entries) = std::fs::read_dir(&projects_root) {
        for entry in entries.flatten() {
            if entry.path().is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    names.insert(name.to_string());
                }
            }
        }
    }

    if let Some(host_config) = host_config {
        for name in host_config.projects.keys() {
            names.insert(name.clone());
        }
    }

    names.into_iter().collect()
}
