//! Plan entities (spec.md §3, §4.7).

use std::path::PathBuf;

use crate::config::{ComposeAction, HostEntry};

/// Per-file reconciliation decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Unchanged,
    Add,
    Modify,
    Delete,
}

/// An optional presenter hint for redacting secrets in diffs (spec.md §9
/// open question). The core reconciliation logic never reads this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskHint {
    pub prefix: String,
    pub suffix: String,
}

/// One file's plan within a project (spec.md §3).
///
/// Invariants: `local_path` is `None` iff `action == Delete`; `local_data`
/// is empty iff `action == Delete`; `diff` is `Some` only when both sides
/// are text and differ.
#[derive(Debug, Clone)]
pub struct FilePlan {
    pub relative_path: String,
    pub local_path: Option<PathBuf>,
    pub remote_path: PathBuf,
    pub action: Action,
    pub local_data: Vec<u8>,
    pub remote_data: Option<Vec<u8>>,
    pub diff: Option<String>,
    pub mask_hints: Vec<MaskHint>,
}

/// One configured directory's plan (spec.md §3).
#[derive(Debug, Clone)]
pub struct DirPlan {
    pub relative_path: String,
    pub remote_path: PathBuf,
    pub exists: bool,
}

/// The reconciled compose action for a project (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeActionType {
    NoChange,
    StartServices,
    StopServices,
}

#[derive(Debug, Clone)]
pub struct ComposePlan {
    pub desired_action: ComposeAction,
    pub action_type: ComposeActionType,
    pub services: Vec<String>,
}

/// Aggregated plan for one project on one host (spec.md §3).
#[derive(Debug, Clone)]
pub struct ProjectPlan {
    pub project_name: String,
    pub remote_dir: PathBuf,
    pub post_sync_command: String,
    pub dirs: Vec<DirPlan>,
    pub files: Vec<FilePlan>,
    pub compose: Option<ComposePlan>,
    pub remove_orphans: bool,
}

impl ProjectPlan {
    /// True iff any file action is not `Unchanged`, any dir doesn't exist
    /// yet, or the compose plan isn't `NoChange` (spec.md §4.7 `HasChanges`).
    pub fn has_changes(&self) -> bool {
        self.files.iter().any(|f| f.action != Action::Unchanged)
            || self.dirs.iter().any(|d| !d.exists)
            || self
                .compose
                .as_ref()
                .is_some_and(|c| c.action_type != ComposeActionType::NoChange)
    }
}

#[derive(Debug, Clone)]
pub struct HostPlan {
    pub host: HostEntry,
    pub projects: Vec<ProjectPlan>,
}

#[derive(Debug, Clone, Default)]
pub struct SyncPlan {
    pub host_plans: Vec<HostPlan>,
}

impl SyncPlan {
    pub fn has_changes(&self) -> bool {
        self.host_plans
            .iter()
            .any(|h| h.projects.iter().any(|p| p.has_changes()))
    }
}
