use std::path::Path;

use anyhow::{Context, Result};

use crate::compose::DockerComposeInspector;
use crate::config::load_cmt_config;
use crate::plan::PlanBuilder;
use crate::ssh::SystemSshResolver;
use crate::transport::SshClientFactory;
use crate::ui::{detect_capabilities, render_plan};

pub fn cmd_plan(config_path: &Path, hosts: &[String], projects: &[String], debug: bool) -> Result<()> {
    let config = load_cmt_config(config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    if debug {
        eprintln!("[debug] loaded config from {}", config_path.display());
        eprintln!("[debug] {} host(s) configured", config.hosts.len());
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
    Ok(())
}
