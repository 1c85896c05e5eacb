//! Compose state inspection (spec.md §4.7's "desired already holds" rule).
//!
//! The reconciliation engine only needs to know whether the desired
//! compose state (`up`/`down`) already holds on the remote, not the full
//! state of every service; out-of-scope state tracking beyond that
//! belongs to `docker compose` itself, not to cmt.

use std::path::Path;

use crate::error::{CmtError, CmtResult};
use crate::plan::{ComposeActionType, ComposePlan};
use crate::config::ComposeAction;
use crate::transport::RemoteClient;

/// Capability: determine whether a project's running services already
/// match a desired compose action.
pub trait ComposeInspector {
    fn inspect(
        &self,
        client: &mut dyn RemoteClient,
        remote_dir: &Path,
        desired: ComposeAction,
    ) -> CmtResult<ComposePlan>;
}

/// Production inspector: runs `docker compose ps --services --status
/// running` in the project's remote directory.
pub struct DockerComposeInspector;

impl ComposeInspector for DockerComposeInspector {
    fn inspect(
        &self,
        client: &mut dyn RemoteClient,
        remote_dir: &Path,
        desired: ComposeAction,
    ) -> CmtResult<ComposePlan> {
        if desired == ComposeAction::Ignore {
            return Ok(ComposePlan {
                desired_action: desired,
                action_type: ComposeActionType::NoChange,
                services: Vec::new(),
            });
        }

        let output = client
            .run_command(remote_dir, "docker compose ps --services --status running")
            .unwrap_or_default();
        let running: Vec<String> = output
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();

        let action_type = match desired {
            ComposeAction::Up if running.is_empty() => ComposeActionType::StartServices,
            ComposeAction::Down if !running.is_empty() => ComposeActionType::StopServices,
            _ => ComposeActionType::NoChange,
        };

        Ok(ComposePlan {
            desired_action: desired,
            action_type,
            services: running,
        })
    }
}

/// Run the compose action decided by a `ComposePlan` (spec.md §4.9 step 5).
pub fn apply_compose_plan(
    client: &mut dyn RemoteClient,
    remote_dir: &Path,
    plan: &ComposePlan,
    remove_orphans: bool,
    host: &str,
    project: &str,
) -> CmtResult<()> {
    let command = match plan.action_type {
        ComposeActionType::NoChange => return Ok(()),
        ComposeActionType::StartServices => "docker compose up -d".to_string(),
        ComposeActionType::StopServices => {
            if remove_orphans {
                "docker compose down --remove-orphans".to_string()
            } else {
                "docker compose down".to_string()
            }
        }
    };

    client
        .run_command(remote_dir, &command)
        .map(|_| ())
        .map_err(|_| CmtError::Compose {
            host: host.to_string(),
            project: project.to_string(),
            output: format!("command failed: {command}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::FakeRemoteClient;

    #[test]
    fn ignore_action_is_always_no_change() {
        let inspector = DockerComposeInspector;
        let mut client = FakeRemoteClient::new();
        let plan = inspector
            .inspect(&mut client, Path::new("/srv/grafana"), ComposeAction::Ignore)
            .unwrap();
        assert_eq!(plan.action_type, ComposeActionType::NoChange);
    }

    #[test]
    fn up_with_no_running_services_starts_services() {
        let inspector = DockerComposeInspector;
        let mut client = FakeRemoteClient::new();
        let plan = inspector
            .inspect(&mut client, Path::new("/srv/grafana"), ComposeAction::Up)
            .unwrap();
        assert_eq!(plan.action_type, ComposeActionType::StartServices);
    }

    #[test]
    fn apply_compose_plan_no_change_runs_nothing() {
        let mut client = FakeRemoteClient::new();
        let plan = ComposePlan {
            desired_action: ComposeAction::Up,
            action_type: ComposeActionType::NoChange,
            services: vec![],
        };
        apply_compose_plan(&mut client, Path::new("/srv/grafana"), &plan, false, "server1", "grafana")
            .unwrap();
    }
}
