//! Configuration type definitions (spec.md §3, §4.1).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{CmtError, CmtResult};

/// Desired compose state for a project (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ComposeAction {
    Up,
    Down,
    Ignore,
}

impl ComposeAction {
    /// `""` normalizes to `up` (spec.md §4.1).
    fn normalize(raw: Option<&str>) -> Option<Self> {
        match raw {
            None | Some("") => None,
            Some("up") => Some(Self::Up),
            Some("down") => Some(Self::Down),
            Some("ignore") => Some(Self::Ignore),
            Some(_) => None,
        }
    }
}

impl Default for ComposeAction {
    fn default() -> Self {
        Self::Up
    }
}

/// Default glob list for `templateVarSources` (spec.md §3).
pub fn default_template_var_sources() -> Vec<String> {
    vec!["*.yml".to_string(), "*.yaml".to_string()]
}

/// A connection descriptor for one remote host (spec.md §3).
///
/// `proxy_command`, `identity_files`, and `identity_agent` are populated by
/// the SSH parameter resolver (C2); they are not user-visible YAML fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct HostEntry {
    pub name: String,
    pub host: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub user: String,
    #[serde(default, rename = "keyPath")]
    pub key_path: Option<PathBuf>,
    #[serde(default)]
    pub agent: bool,

    #[serde(skip)]
    pub proxy_command: Option<String>,
    #[serde(skip)]
    pub identity_files: Vec<PathBuf>,
    #[serde(skip)]
    pub identity_agent: Option<String>,
}

/// Low-priority defaults (spec.md §3).
#[derive(Debug, Clone, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SyncDefaults {
    #[serde(default, rename = "remotePath")]
    pub remote_path: Option<String>,
    #[serde(default, rename = "postSyncCommand")]
    pub post_sync_command: Option<String>,
    #[serde(default, rename = "composeAction")]
    pub compose_action: Option<String>,
    #[serde(default, rename = "templateVarSources")]
    pub template_var_sources: Option<Vec<String>>,
}

/// One directory cmt ensures exists on the remote (spec.md §3).
///
/// Accepts either a bare path string or a single-key mapping
/// `<path>: { permission?, owner?, group? }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct DirConfig {
    pub path: String,
    pub permission: Option<String>,
    pub owner: Option<String>,
    pub group: Option<String>,
}

impl DirConfig {
    pub fn validate(&self) -> CmtResult<()> {
        if self.path.is_empty() {
            return Err(CmtError::Config("dir path must not be empty".into()));
        }
        if let Some(perm) = &self.permission {
            if perm.is_empty() || !perm.chars().all(|c| ('0'..='7').contains(&c)) {
                return Err(CmtError::InvalidPermission {
                    path: self.path.clone(),
                    value: perm.clone(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum DirConfigDe {
    Bare(String),
    Keyed(std::collections::BTreeMap<String, DirConfigBody>),
}

#[derive(Debug, Clone, Default, Deserialize)]
struct DirConfigBody {
    #[serde(default)]
    permission: Option<String>,
    #[serde(default)]
    owner: Option<String>,
    #[serde(default)]
    group: Option<String>,
}

impl<'de> Deserialize<'de> for DirConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        match DirConfigDe::deserialize(deserializer)? {
            DirConfigDe::Bare(path) => Ok(DirConfig {
                path,
                permission: None,
                owner: None,
                group: None,
            }),
            DirConfigDe::Keyed(map) => {
                let mut iter = map.into_iter();
                let (path, body) = iter.next().unwrap_or_default();
                Ok(DirConfig {
                    path,
                    permission: body.permission,
                    owner: body.owner,
                    group: body.group,
                })
            }
        }
    }
}

/// High-priority per-project overrides (spec.md §3).
#[derive(Debug, Clone, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ProjectConfig {
    #[serde(default, rename = "remotePath")]
    pub remote_path: Option<String>,
    #[serde(default, rename = "postSyncCommand")]
    pub post_sync_command: Option<String>,
    #[serde(default, rename = "composeAction")]
    pub compose_action: Option<String>,
    #[serde(default, rename = "removeOrphans")]
    pub remove_orphans: Option<bool>,
    #[serde(default)]
    pub dirs: Vec<DirConfig>,
    #[serde(default, rename = "templateVarSources")]
    pub template_var_sources: Option<Vec<String>>,
}

/// Middle-priority per-host config, `hosts/<name>/host.yml` (spec.md §3).
#[derive(Debug, Clone, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct HostConfig {
    #[serde(default, rename = "sshConfig")]
    pub ssh_config: Option<PathBuf>,
    #[serde(default, rename = "remotePath")]
    pub remote_path: Option<String>,
    #[serde(default, rename = "postSyncCommand")]
    pub post_sync_command: Option<String>,
    #[serde(default, rename = "composeAction")]
    pub compose_action: Option<String>,
    #[serde(default, rename = "templateVarSources")]
    pub template_var_sources: Option<Vec<String>>,
    #[serde(default)]
    pub projects: std::collections::BTreeMap<String, Option<ProjectConfig>>,
}

/// A single hook slot: `{command: string}`, entirely absent if unset.
#[derive(Debug, Clone, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct HookConfig {
    pub command: String,
}

/// The three lifecycle hook slots (spec.md §6).
#[derive(Debug, Clone, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct BeforeApplyHooks {
    #[serde(default, rename = "beforePlan")]
    pub before_plan: Option<HookConfig>,
    #[serde(default, rename = "beforeApplyPrompt")]
    pub before_apply_prompt: Option<HookConfig>,
    #[serde(default, rename = "beforeApply")]
    pub before_apply: Option<HookConfig>,
}

/// Top-level cmt config YAML (spec.md §6).
#[derive(Debug, Clone, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CmtConfig {
    #[serde(rename = "basePath")]
    pub base_path: PathBuf,
    #[serde(default)]
    pub defaults: SyncDefaults,
    pub hosts: Vec<HostEntry>,
    #[serde(default, rename = "beforeApplyHooks")]
    pub before_apply_hooks: BeforeApplyHooks,
}

/// The merged configuration for one (host, project) pair (spec.md §3).
///
/// Invariant: `remote_path` is non-empty, else plan-building fails for that
/// pair (spec.md §4.1, §7).
#[derive(Debug, Clone)]
pub struct ResolvedProjectConfig {
    pub remote_path: String,
    pub post_sync_command: String,
    pub compose_action: ComposeAction,
    pub remove_orphans: bool,
    pub dirs: Vec<DirConfig>,
    pub template_var_sources: Vec<String>,
}

/// Merge the three config layers per spec.md §4.1:
/// later layer overrides earlier *only for non-zero* scalar fields;
/// collections (`dirs`, `templateVarSources`) are taken wholesale from the
/// deepest layer that sets them. This function is pure and total.
pub fn resolve_project_config(
    defaults: &SyncDefaults,
    host: Option<&HostConfig>,
    project: Option<&ProjectConfig>,
) -> ResolvedProjectConfig {
    let remote_path = project
        .and_then(|p| p.remote_path.clone())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            host.and_then(|h| h.remote_path.clone())
                .filter(|s| !s.is_empty())
        })
        .or_else(|| defaults.remote_path.clone().filter(|s| !s.is_empty()))
        .unwrap_or_default();

    let post_sync_command = project
        .and_then(|p| p.post_sync_command.clone())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            host.and_then(|h| h.post_sync_command.clone())
                .filter(|s| !s.is_empty())
        })
        .or_else(|| defaults.post_sync_command.clone().filter(|s| !s.is_empty()))
        .unwrap_or_default();

    let compose_action_raw = project
        .and_then(|p| p.compose_action.clone())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            host.and_then(|h| h.compose_action.clone())
                .filter(|s| !s.is_empty())
        })
        .or_else(|| defaults.compose_action.clone().filter(|s| !s.is_empty()));
    let compose_action =
        ComposeAction::normalize(compose_action_raw.as_deref()).unwrap_or_default();

    let remove_orphans = project.and_then(|p| p.remove_orphans).unwrap_or(false);

    let dirs = project
        .map(|p| p.dirs.clone())
        .filter(|d| !d.is_empty())
        .unwrap_or_default();

    let template_var_sources = project
        .and_then(|p| p.template_var_sources.clone())
        .filter(|v| !v.is_empty())
        .or_else(|| {
            host.and_then(|h| h.template_var_sources.clone())
                .filter(|v| !v.is_empty())
        })
        .or_else(|| defaults.template_var_sources.clone().filter(|v| !v.is_empty()))
        .unwrap_or_else(default_template_var_sources);

    ResolvedProjectConfig {
        remote_path,
        post_sync_command,
        compose_action,
        remove_orphans,
        dirs,
        template_var_sources,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn dir_config_bare_string() {
        let de: DirConfig = serde_yaml_ng::from_str("provisioning").unwrap();
        assert_eq!(de.path, "provisioning");
        assert!(de.permission.is_none());
    }

    #[test]
    fn dir_config_keyed_map() {
        let de: DirConfig =
            serde_yaml_ng::from_str("data:\n  permission: \"0750\"\n  owner: grafana\n").unwrap();
        assert_eq!(de.path, "data");
        assert_eq!(de.permission.as_deref(), Some("0750"));
        assert_eq!(de.owner.as_deref(), Some("grafana"));
    }

    #[test]
    fn dir_config_rejects_non_octal_permission() {
        let dc = DirConfig {
            path: "x".into(),
            permission: Some("999".into()),
            owner: None,
            group: None,
        };
        assert!(dc.validate().is_err());
    }

    #[test]
    fn resolve_project_config_scalar_priority_is_project_then_host_then_default() {
        let defaults = SyncDefaults {
            remote_path: Some("/srv/default".into()),
            post_sync_command: None,
            compose_action: None,
            template_var_sources: None,
        };
        let host = HostConfig {
            remote_path: Some("/srv/host".into()),
            ..Default::default()
        };
        let project = ProjectConfig {
            remote_path: None,
            ..Default::default()
        };
        let resolved = resolve_project_config(&defaults, Some(&host), Some(&project));
        assert_eq!(resolved.remote_path, "/srv/host");
    }

    #[test]
    fn resolve_project_config_empty_strings_are_ignored() {
        let defaults = SyncDefaults {
            remote_path: Some("/srv/default".into()),
            ..Default::default()
        };
        let project = ProjectConfig {
            remote_path: Some(String::new()),
            ..Default::default()
        };
        let resolved = resolve_project_config(&defaults, None, Some(&project));
        assert_eq!(resolved.remote_path, "/srv/default");
    }

    #[test]
    fn resolve_project_config_compose_action_defaults_to_up() {
        let resolved = resolve_project_config(&SyncDefaults::default(), None, None);
        assert_eq!(resolved.compose_action, ComposeAction::Up);
    }

    #[test]
    fn resolve_project_config_template_var_sources_default_glob() {
        let resolved = resolve_project_config(&SyncDefaults::default(), None, None);
        assert_eq!(resolved.template_var_sources, default_template_var_sources());
    }

    #[test]
    fn resolve_project_config_dirs_taken_wholesale_from_project() {
        let project = ProjectConfig {
            dirs: vec![DirConfig {
                path: "data".into(),
                permission: None,
                owner: None,
                group: None,
            }],
            ..Default::default()
        };
        let resolved = resolve_project_config(&SyncDefaults::default(), None, Some(&project));
        assert_eq!(resolved.dirs.len(), 1);
    }

    proptest::proptest! {
        /// P3: whichever layer supplies the first non-empty `remotePath`,
        /// scanning project -> host -> defaults, wins -- regardless of what
        /// the other layers say.
        #[test]
        fn remote_path_priority_is_project_then_host_then_default(
            default_path in "[a-z/]{0,12}",
            host_path in "[a-z/]{0,12}",
            project_path in "[a-z/]{0,12}",
        ) {
            let defaults = SyncDefaults { remote_path: Some(default_path.clone()), ..Default::default() };
            let host = HostConfig { remote_path: Some(host_path.clone()), ..Default::default() };
            let project = ProjectConfig { remote_path: Some(project_path.clone()), ..Default::default() };

            let resolved = resolve_project_config(&defaults, Some(&host), Some(&project));

            let expected = if !project_path.is_empty() {
                project_path
            } else if !host_path.is_empty() {
                host_path
            } else {
                default_path
            };
            prop_assert_eq!(resolved.remote_path, expected);
        }

        /// Resolution is pure: calling it twice with the same inputs always
        /// yields the same `ResolvedProjectConfig` (part of P2's determinism
        /// requirement, scoped to the merge step).
        #[test]
        fn resolution_is_deterministic(
            default_path in "[a-z/]{0,12}",
            host_path in "[a-z/]{0,12}",
        ) {
            let defaults = SyncDefaults { remote_path: Some(default_path), ..Default::default() };
            let host = HostConfig { remote_path: Some(host_path), ..Default::default() };

            let first = resolve_project_config(&defaults, Some(&host), None);
            let second = resolve_project_config(&defaults, Some(&host), None);
            prop_assert_eq!(first.remote_path, second.remote_path);
            prop_assert_eq!(first.compose_action, second.compose_action);
        }
    }
}
