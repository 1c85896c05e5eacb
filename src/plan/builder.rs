//! Plan builder (C7, spec.md §4.7).
//!
//! Orchestrates config resolution, SSH parameter resolution, the remote
//! transport, file collection, template rendering, and the manifest into a
//! `SyncPlan`, following the per-host/per-project algorithm verbatim.

use std::path::Path;

use similar::TextDiff;

use crate::compose::ComposeInspector;
use crate::config::loader::{discover_projects, load_host_config};
use crate::config::{resolve_project_config, CmtConfig, ComposeAction, DirConfig, HostEntry};
use crate::error::{CmtError, CmtResult};
use crate::manifest::read_manifest;
use crate::ssh::SshConfigResolver;
use crate::template::{load_template_vars, render_template};
use crate::transport::ClientFactory;

use super::entities::{Action, DirPlan, FilePlan, HostPlan, ProjectPlan, SyncPlan};

const BINARY_PROBE_WINDOW: usize = 8192;

pub struct PlanBuilder<'a> {
    pub config: &'a CmtConfig,
    pub ssh_resolver: &'a dyn SshConfigResolver,
    pub client_factory: &'a dyn ClientFactory,
    pub compose_inspector: &'a dyn ComposeInspector,
    pub host_filter: &'a [String],
    pub project_filter: &'a [String],
}

impl<'a> PlanBuilder<'a> {
    /// Build a `SyncPlan` covering every filtered host/project pair
    /// (spec.md §4.7).
    pub fn build(&self) -> CmtResult<SyncPlan> {
        let mut host_plans = Vec::new();

        for host_entry in &self.config.hosts {
            if !self.host_filter.is_empty() && !self.host_filter.contains(&host_entry.name) {
                continue;
            }
            host_plans.push(self.build_host_plan(host_entry)?);
        }

        Ok(SyncPlan { host_plans })
    }

    fn build_host_plan(&self, host_entry: &HostEntry) -> CmtResult<HostPlan> {
        // 1. Load host.yml (absent -> null).
        let host_config = load_host_config(&self.config.base_path, &host_entry.name)?;

        // 2. Resolve SSH parameters into the HostEntry.
        let ssh_config_path = host_config
            .as_ref()
            .and_then(|h| h.ssh_config.clone());
        let host_dir = crate::config::loader::host_dir(&self.config.base_path, &host_entry.name);
        let resolved_host = self.ssh_resolver.resolve(
            host_entry,
            ssh_config_path.as_deref(),
            &host_dir,
        )?;

        // 3. Open a RemoteClient.
        let mut client = self.client_factory.connect(&resolved_host)?;

        let project_names = discover_projects(&self.config.base_path, host_config.as_ref());
        let mut projects = Vec::new();

        for project_name in &project_names {
            if !self.project_filter.is_empty() && !self.project_filter.contains(project_name) {
                continue;
            }

            let project_config = host_config
                .as_ref()
                .and_then(|h| h.projects.get(project_name))
                .and_then(|p| p.clone());

            let project_plan = self.build_project_plan(
                client.as_mut(),
                &resolved_host.name,
                project_name,
                host_config.as_ref(),
                project_config.as_ref(),
            );

            let project_plan = match project_plan {
                Ok(plan) => plan,
                Err(err) => {
                    client.close()?;
                    return Err(err);
                }
            };
            projects.push(project_plan);
        }

        // 5. Close the client.
        client.close()?;

        Ok(HostPlan {
            host: resolved_host,
            projects,
        })
    }

    fn build_project_plan(
        &self,
        client: &mut dyn crate::transport::RemoteClient,
        host_name: &str,
        project_name: &str,
        host_config: Option<&crate::config::HostConfig>,
        project_config: Option<&crate::config::ProjectConfig>,
    ) -> CmtResult<ProjectPlan> {
        // a. Merge config; fail if remotePath is empty.
        let resolved =
            resolve_project_config(&self.config.defaults, host_config, project_config);
        if resolved.remote_path.is_empty() {
            return Err(CmtError::EmptyRemotePath {
                host: host_name.to_string(),
                project: project_name.to_string(),
            });
        }
        let remote_dir = Path::new(&resolved.remote_path).to_path_buf();

        // b. For each configured dir, build a DirPlan.
        let dirs = self.build_dir_plans(client, &remote_dir, &resolved.dirs)?;

        // c. Load template vars and collect local files.
        let vars = load_template_vars(
            &self.config.base_path,
            host_name,
            project_name,
            &resolved.template_var_sources,
        )?;
        let local_files = crate::collector::collect_files(&self.config.base_path, host_name, project_name);

        // d. Read the remote manifest.
        let manifest = read_manifest(client, &remote_dir);

        // e. Build FilePlans: one per local file, plus deletions for
        // manifest entries with no local counterpart.
        let mut files = Vec::new();
        for (relative_path, local_path) in &local_files {
            files.push(self.build_file_plan(
                client,
                &remote_dir,
                relative_path,
                local_path,
                &vars,
            )?);
        }
        for managed in &manifest.managed_files {
            if local_files.contains_key(managed) {
                continue;
            }
            files.push(self.build_delete_plan(client, &remote_dir, managed));
        }

        // f. Sort FilePlans by relative path.
        files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

        // g. If composeAction in {up, down}, build a ComposePlan.
        let compose = if resolved.compose_action == ComposeAction::Ignore {
            None
        } else {
            Some(self.compose_inspector.inspect(client, &remote_dir, resolved.compose_action)?)
        };

        Ok(ProjectPlan {
            project_name: project_name.to_string(),
            remote_dir,
            post_sync_command: resolved.post_sync_command,
            dirs,
            files,
            compose,
            remove_orphans: resolved.remove_orphans,
        })
    }

    fn build_dir_plans(
        &self,
        client: &mut dyn crate::transport::RemoteClient,
        remote_dir: &Path,
        dirs: &[DirConfig],
    ) -> CmtResult<Vec<DirPlan>> {
        let mut out = Vec::with_capacity(dirs.len());
        for dir in dirs {
            dir.validate()?;
            let remote_path = remote_dir.join(&dir.path);
            let exists = client.stat(&remote_path)?;
            out.push(DirPlan {
                relative_path: dir.path.clone(),
                remote_path,
                exists,
            });
        }
        Ok(out)
    }

    fn build_file_plan(
        &self,
        client: &mut dyn crate::transport::RemoteClient,
        remote_dir: &Path,
        relative_path: &str,
        local_path: &Path,
        vars: &std::collections::BTreeMap<String, String>,
    ) -> CmtResult<FilePlan> {
        let raw = std::fs::read(local_path)?;
        let rendered = render_template(&raw, vars, relative_path)?;
        let remote_path = remote_dir.join(relative_path);
        let remote_data = client.read_file(&remote_path)?;

        let (action, diff) = match &remote_data {
            None => (Action::Add, None),
            Some(existing) if existing == &rendered => (Action::Unchanged, None),
            Some(existing) => {
                let diff = unified_diff(relative_path, existing, &rendered);
                (Action::Modify, diff)
            }
        };

        Ok(FilePlan {
            relative_path: relative_path.to_string(),
            local_path: Some(local_path.to_path_buf()),
            remote_path,
            action,
            local_data: rendered,
            remote_data,
            diff,
            mask_hints: Vec::new(),
        })
    }

    fn build_delete_plan(
        &self,
        client: &mut dyn crate::transport::RemoteClient,
        remote_dir: &Path,
        relative_path: &str,
    ) -> FilePlan {
        let remote_path = remote_dir.join(relative_path);
        let remote_data = client.read_file(&remote_path).ok().flatten();
        FilePlan {
            relative_path: relative_path.to_string(),
            local_path: None,
            remote_path,
            action: Action::Delete,
            local_data: Vec::new(),
            remote_data,
            diff: None,
            mask_hints: Vec::new(),
        }
    }
}

/// Unified diff with 3 lines of context, only when both sides look like
/// text (no NUL in the first 8 KiB of either, spec.md §4.8/§9).
fn unified_diff(path: &str, old: &[u8], new: &[u8]) -> Option<String> {
    let probe = |data: &[u8]| {
        let len = data.len().min(BINARY_PROBE_WINDOW);
        !data[..len].contains(&0u8)
    };
    if !probe(old) || !probe(new) {
        return None;
    }
    let old_text = String::from_utf8_lossy(old);
    let new_text = String::from_utf8_lossy(new);
    if old_text == new_text {
        return None;
    }
    let diff = TextDiff::from_lines(old_text.as_ref(), new_text.as_ref());
    let header_a = format!("a/{path}");
    let header_b = format!("b/{path}");
    Some(
        diff.unified_diff()
            .context_radius(3)
            .header(&header_a, &header_b)
            .to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::DockerComposeInspector;
    use crate::config::{CmtConfig, HostEntry, SyncDefaults};
    use crate::ssh::SshConfigResolver;
    use crate::transport::{ClientFactory, FakeRemoteClient, RemoteClient};
    use std::sync::Mutex;

    struct IdentitySshResolver;
    impl SshConfigResolver for IdentitySshResolver {
        fn resolve(
            &self,
            entry: &HostEntry,
            _ssh_config_path: Option<&Path>,
            _host_dir: &Path,
        ) -> CmtResult<HostEntry> {
            Ok(entry.clone())
        }
    }

    struct SharedFakeFactory {
        client: Mutex<Option<FakeRemoteClient>>,
    }

    impl ClientFactory for SharedFakeFactory {
        fn connect(&self, _entry: &HostEntry) -> CmtResult<Box<dyn RemoteClient>> {
            let client = self.client.lock().unwrap().take().expect("single use in this test");
            Ok(Box::new(client))
        }
    }

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn fresh_project_produces_add_plans_for_every_local_file() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("projects/grafana/compose.yml"), "services: {}\n");

        let config = CmtConfig {
            base_path: dir.path().to_path_buf(),
            defaults: SyncDefaults {
                remote_path: Some("/srv/grafana".into()),
                ..Default::default()
            },
            hosts: vec![HostEntry {
                name: "server1".into(),
                host: "server1.example.com".into(),
                ..Default::default()
            }],
            before_apply_hooks: Default::default(),
        };

        let factory = SharedFakeFactory {
            client: Mutex::new(Some(FakeRemoteClient::new())),
        };
        let resolver = IdentitySshResolver;
        let inspector = DockerComposeInspector;
        let builder = PlanBuilder {
            config: &config,
            ssh_resolver: &resolver,
            client_factory: &factory,
            compose_inspector: &inspector,
            host_filter: &[],
            project_filter: &[],
        };

        let plan = builder.build().unwrap();
        assert_eq!(plan.host_plans.len(), 1);
        let project = &plan.host_plans[0].projects[0];
        assert_eq!(project.files.len(), 1);
        assert_eq!(project.files[0].action, Action::Add);
        assert!(plan.has_changes());
    }

    #[test]
    fn empty_remote_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("projects/grafana")).unwrap();

        let config = CmtConfig {
            base_path: dir.path().to_path_buf(),
            defaults: SyncDefaults::default(),
            hosts: vec![HostEntry {
                name: "server1".into(),
                host: "server1.example.com".into(),
                ..Default::default()
            }],
            before_apply_hooks: Default::default(),
        };

        let factory = SharedFakeFactory {
            client: Mutex::new(Some(FakeRemoteClient::new())),
        };
        let resolver = IdentitySshResolver;
        let inspector = DockerComposeInspector;
        let builder = PlanBuilder {
            config: &config,
            ssh_resolver: &resolver,
            client_factory: &factory,
            compose_inspector: &inspector,
            host_filter: &[],
            project_filter: &[],
        };

        let err = builder.build().unwrap_err();
        assert!(matches!(err, CmtError::EmptyRemotePath { .. }));
    }

    #[test]
    fn manifest_entry_with_no_local_file_becomes_a_delete() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("projects/grafana/compose.yml"), "services: {}\n");

        let config = CmtConfig {
            base_path: dir.path().to_path_buf(),
            defaults: SyncDefaults {
                remote_path: Some("/srv/grafana".into()),
                ..Default::default()
            },
            hosts: vec![HostEntry {
                name: "server1".into(),
                host: "server1.example.com".into(),
                ..Default::default()
            }],
            before_apply_hooks: Default::default(),
        };

        let manifest = crate::manifest::Manifest::from_relative_paths(vec![
            "compose.yml".to_string(),
            "stale.conf".to_string(),
        ]);
        let client = FakeRemoteClient::new()
            .with_file("/srv/grafana/.cmt-manifest.json", manifest.to_json().unwrap())
            .with_file("/srv/grafana/stale.conf", "old content");

        let factory = SharedFakeFactory {
            client: Mutex::new(Some(client)),
        };
        let resolver = IdentitySshResolver;
        let inspector = DockerComposeInspector;
        let builder = PlanBuilder {
            config: &config,
            ssh_resolver: &resolver,
            client_factory: &factory,
            compose_inspector: &inspector,
            host_filter: &[],
            project_filter: &[],
        };

        let plan = builder.build().unwrap();
        let project = &plan.host_plans[0].projects[0];
        let stale = project.files.iter().find(|f| f.relative_path == "stale.conf").unwrap();
        assert_eq!(stale.action, Action::Delete);
        assert!(stale.local_path.is_none());
    }

    #[test]
    fn host_filter_excludes_unmatched_hosts() {
        let dir = tempfile::tempdir().unwrap();
        let config = CmtConfig {
            base_path: dir.path().to_path_buf(),
            defaults: SyncDefaults::default(),
            hosts: vec![
                HostEntry { name: "server1".into(), host: "h1".into(), ..Default::default() },
                HostEntry { name: "server2".into(), host: "h2".into(), ..Default::default() },
            ],
            before_apply_hooks: Default::default(),
        };

        let factory = SharedFakeFactory {
            client: Mutex::new(Some(FakeRemoteClient::new())),
        };
        let resolver = IdentitySshResolver;
        let inspector = DockerComposeInspector;
        let host_filter = vec!["server2".to_string()];
        let builder = PlanBuilder {
            config: &config,
            ssh_resolver: &resolver,
            client_factory: &factory,
            compose_inspector: &inspector,
            host_filter: &host_filter,
            project_filter: &[],
        };

        let plan = builder.build().unwrap();
        assert_eq!(plan.host_plans.len(), 1);
        assert_eq!(plan.host_plans[0].host.name, "server2");
    }
}
