use std::path::Path;

use anyhow::{Context, Result};
use dialoguer::Confirm;

use crate::apply::{ApplyExecutor, ApplyOptions};
use crate::compose::DockerComposeInspector;
use crate::config::load_cmt_config;
use crate::plan::PlanBuilder;
use crate::ssh::SystemSshResolver;
use crate::transport::SshClientFactory;
use crate::ui::{detect_capabilities, render_plan};

pub fn cmd_apply(
    config_path: &Path,
    hosts: &[String],
    projects: &[String],
    auto_approve: bool,
    debug: bool,
) -> Result<()> {
    let config = load_cmt_config(config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    if debug {
        eprintln!("[debug] loaded config from {}", config_path.display());
    }

    let resolver = SystemSshResolver;
    let factory = SshClientFactory;
    let inspector = DockerComposeInspector;
    let builder = PlanBuilder {
        config: &config,
        ssh_resolver: &resolver,
        client_factory: &factory,
        compose_inspector: &inspector,
        host_filter: hosts,
        project_filter: projects,
    };

    let plan = builder.build().context("failed to build plan")?;

    let caps = detect_capabilities();
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    render_plan(&plan, &caps, &mut handle)?;

    let executor = ApplyExecutor {
        client_factory: &factory,
        hooks: &config.before_apply_hooks,
        config_path,
        base_path: &config.base_path,
    };
    let options = ApplyOptions {
        auto_approve,
        refresh_only: false,
    };
    let mut approve = || {
        Confirm::new()
            .with_prompt("Apply this plan?")
            .default(false)
            .interact()
            .unwrap_or(false)
    };

    executor.apply(&plan, &options, &mut handle, &mut approve)?;
    Ok(())
}
