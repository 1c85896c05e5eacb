//! cmt CLI surface (spec.md §6).
//!
//! `cmt [--config <path>] [--debug] <plan|apply|schema> ...`

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "cmt")]
#[command(author, version, about = "Plan/apply synchronizer for fleets of Docker Compose hosts", long_about = None)]
pub struct Cli {
    /// Path to the root cmt config file.
    #[arg(long, global = true, default_value = "config.yml")]
    pub config: PathBuf,

    /// Print diagnostic traces of engine decisions.
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute and print the reconciliation plan without applying it.
    Plan {
        /// Restrict planning to these hosts (repeatable).
        #[arg(long = "host")]
        hosts: Vec<String>,

        /// Restrict planning to these projects (repeatable).
        #[arg(long = "project")]
        projects: Vec<String>,
    },

    /// Compute the plan, then reconcile the fleet to match it.
    Apply {
        #[arg(long = "host")]
        hosts: Vec<String>,

        #[arg(long = "project")]
        projects: Vec<String>,

        /// Skip the interactive approval prompt.
        #[arg(long)]
        auto_approve: bool,
    },

    /// Emit the JSON Schema for a cmt config shape.
    Schema {
        kind: SchemaKind,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    Cmt,
    Host,
    HookBeforePlan,
    HookBeforeApplyPrompt,
    HookBeforeApply,
}
