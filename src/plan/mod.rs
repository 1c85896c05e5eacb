//! Reconciliation plan (C7, spec.md §3, §4.7).

pub mod builder;
pub mod entities;

pub use builder::PlanBuilder;
pub use entities::{
    Action, ComposeActionType, ComposePlan, DirPlan, FilePlan, HostPlan, MaskHint, ProjectPlan,
    SyncPlan,
};
