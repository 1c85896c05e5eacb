//! Apply executor (C9, spec.md §4.9).
//!
//! Consumes a prebuilt `SyncPlan` verbatim; never rebuilds it. A single
//! step-numbered method body drives the whole flow: no conflict resolver
//! (the manifest already decides add/modify/delete/unchanged
//! deterministically), no orphan detector beyond manifest-diff deletion, no
//! event sink abstraction (a single-threaded CLI writes directly to its
//! output sink).

use std::io::Write;

use crate::compose::apply_compose_plan;
use crate::config::BeforeApplyHooks;
use crate::error::CmtResult;
use crate::hooks::{indent, run_hook, HookOutcome, HookPayload, HookPaths};
use crate::manifest::{write_manifest, Manifest};
use crate::plan::{Action, ComposeActionType, HostPlan, ProjectPlan, SyncPlan};
use crate::transport::ClientFactory;

#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    pub auto_approve: bool,
    /// Force manifest rewrite even when the plan otherwise has no changes
    /// (spec.md §4.9 step 2, "manifest-refresh mode").
    pub refresh_only: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ApplyResult {
    pub applied: bool,
    pub cancelled: bool,
    pub files_added: usize,
    pub files_modified: usize,
    pub files_deleted: usize,
    pub dirs_created: usize,
    pub compose_started: usize,
    pub compose_stopped: usize,
}

impl ApplyResult {
    fn files_synced(&self) -> usize {
        self.files_added + self.files_modified + self.files_deleted
    }
}

pub struct ApplyExecutor<'a> {
    pub client_factory: &'a dyn ClientFactory,
    pub hooks: &'a BeforeApplyHooks,
    /// Path to the loaded config file, surfaced to hooks as `paths.configPath`.
    pub config_path: &'a std::path::Path,
    /// Resolved base path, surfaced to hooks as `paths.basePath`.
    pub base_path: &'a std::path::Path,
}

impl<'a> ApplyExecutor<'a> {
    /// Run the full apply flow against `plan`, prompting for approval on
    /// `approve` unless `options.auto_approve` is set. `out` receives the
    /// plan print and hook output; `approve` is called once, after the
    /// plan is printed, to decide whether to proceed.
    pub fn apply(
        &self,
        plan: &SyncPlan,
        options: &ApplyOptions,
        out: &mut dyn Write,
        approve: &mut dyn FnMut() -> bool,
    ) -> CmtResult<ApplyResult> {
        // Step 1: no-changes short circuit (bypassed by refresh_only).
        if !plan.has_changes() && !options.refresh_only {
            writeln!(out, "No changes. Your infrastructure matches the configuration.")?;
            return Ok(ApplyResult::default());
        }

        // Step 2: beforePlan hook.
        if let Some(gate) = self.run_gate("beforePlan", self.hooks.before_plan.as_ref(), plan, out)? {
            return Ok(gate);
        }

        // Step 3: approval prompt, unless --auto-approve.
        if !options.auto_approve && !approve() {
            writeln!(out, "Apply cancelled.")?;
            return Ok(ApplyResult {
                cancelled: true,
                ..Default::default()
            });
        }

        // Step 4: single post-prompt gate, beforeApplyPrompt then beforeApply.
        if let Some(gate) =
            self.run_gate("beforeApplyPrompt", self.hooks.before_apply_prompt.as_ref(), plan, out)?
        {
            return Ok(gate);
        }
        if let Some(gate) = self.run_gate("beforeApply", self.hooks.before_apply.as_ref(), plan, out)? {
            return Ok(gate);
        }

        // Steps 5-7: ordered per-host/per-project mutation, fail-fast.
        let mut result = ApplyResult {
            applied: true,
            ..Default::default()
        };
        for host_plan in &plan.host_plans {
            self.apply_host(host_plan, options, &mut result, out)?;
        }

        // Step 8: summary.
        write!(
            out,
            "{} file(s) synced ({} added, {} modified, {} deleted)",
            result.files_synced(),
            result.files_added,
            result.files_modified,
            result.files_deleted
        )?;
        if result.compose_started > 0 || result.compose_stopped > 0 {
            write!(
                out,
                ", compose: {} started, {} stopped",
                result.compose_started, result.compose_stopped
            )?;
        }
        writeln!(out)?;

        Ok(result)
    }

    fn run_gate(
        &self,
        name: &str,
        hook: Option<&crate::config::HookConfig>,
        plan: &SyncPlan,
        out: &mut dyn Write,
    ) -> CmtResult<Option<ApplyResult>> {
        let Some(hook) = hook else {
            return Ok(None);
        };
        let payload = HookPayload {
            hosts: plan.host_plans.iter().map(|h| h.host.name.clone()).collect(),
            working_dir: std::env::current_dir()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            paths: HookPaths {
                config_path: self.config_path.display().to_string(),
                base_path: self.base_path.display().to_string(),
            },
        };
        let (outcome, output) = run_hook(name, hook, &payload)?;
        if !output.trim().is_empty() {
            writeln!(out, "{name}:")?;
            writeln!(out, "{}", indent(&output))?;
        }
        match outcome {
            HookOutcome::Continue => Ok(None),
            HookOutcome::Reject => {
                writeln!(out, "Apply rejected by hook '{name}'.")?;
                Ok(Some(ApplyResult {
                    cancelled: true,
                    ..Default::default()
                }))
            }
        }
    }

    fn apply_host(
        &self,
        host_plan: &HostPlan,
        options: &ApplyOptions,
        result: &mut ApplyResult,
        out: &mut dyn Write,
    ) -> CmtResult<()> {
        let mut client = self.client_factory.connect(&host_plan.host)?;

        for project in &host_plan.projects {
            let outcome = self.apply_project(client.as_mut(), &host_plan.host.name, project, options, result, out);
            if let Err(err) = outcome {
                client.close()?;
                return Err(err);
            }
        }

        client.close()
    }

    fn apply_project(
        &self,
        client: &mut dyn crate::transport::RemoteClient,
        host_name: &str,
        project: &ProjectPlan,
        options: &ApplyOptions,
        result: &mut ApplyResult,
        out: &mut dyn Write,
    ) -> CmtResult<()> {
        if !project.has_changes() && !options.refresh_only {
            return Ok(());
        }

        // dirs
        for dir in &project.dirs {
            if dir.exists {
                continue;
            }
            client.mkdir_all(&dir.remote_path)?;
            result.dirs_created += 1;
        }

        // files
        for file in &project.files {
            match file.action {
                Action::Add => {
                    client.write_file(&file.remote_path, &file.local_data)?;
                    result.files_added += 1;
                }
                Action::Modify => {
                    client.write_file(&file.remote_path, &file.local_data)?;
                    result.files_modified += 1;
                }
                Action::Delete => {
                    client.remove(&file.remote_path)?;
                    result.files_deleted += 1;
                }
                Action::Unchanged => {}
            }
        }

        // manifest
        let managed = project
            .files
            .iter()
            .filter(|f| f.action != Action::Delete)
            .map(|f| f.relative_path.clone());
        write_manifest(client, &project.remote_dir, &Manifest::from_relative_paths(managed))?;

        // post-sync command
        if !project.post_sync_command.is_empty() {
            client.run_command(&project.remote_dir, &project.post_sync_command)?;
        }

        // compose action
        if let Some(compose) = &project.compose {
            match compose.action_type {
                ComposeActionType::StartServices => {
                    apply_compose_plan(
                        client,
                        &project.remote_dir,
                        compose,
                        project.remove_orphans,
                        host_name,
                        &project.project_name,
                    )?;
                    result.compose_started += 1;
                }
                ComposeActionType::StopServices => {
                    apply_compose_plan(
                        client,
                        &project.remote_dir,
                        compose,
                        project.remove_orphans,
                        host_name,
                        &project.project_name,
                    )?;
                    result.compose_stopped += 1;
                }
                ComposeActionType::NoChange => {}
            }
        }

        writeln!(out, "applied {}/{}", host_name, project.project_name)?;
        Ok(())
    }
}
