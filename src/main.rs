//! cmt CLI - plan/apply synchronizer for fleets of Docker Compose hosts
//!
//! Usage: cmt <COMMAND>

use anyhow::Result;
use clap::Parser;

use cmt::cli::{Cli, Commands};
use cmt::commands;

fn main() {
    let cli = Cli::parse();

    let result = dispatch(cli);

    if let Err(err) = result {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Plan { hosts, projects } => {
            commands::plan::cmd_plan(&cli.config, &hosts, &projects, cli.debug)
        }
        Commands::Apply {
            hosts,
            projects,
            auto_approve,
        } => commands::apply::cmd_apply(&cli.config, &hosts, &projects, auto_approve, cli.debug),
        Commands::Schema { kind } => commands::schema::cmd_schema(kind),
    }
}
