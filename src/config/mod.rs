//! Layered configuration resolver (C1, spec.md §4.1).

pub mod loader;
pub mod types;

pub use loader::{discover_projects, host_dir, host_project_dir, load_cmt_config, load_host_config, project_dir};
pub use types::{
    resolve_project_config, BeforeApplyHooks, CmtConfig, ComposeAction, DirConfig, HookConfig,
    HostConfig, HostEntry, ProjectConfig, ResolvedProjectConfig, SyncDefaults,
};
