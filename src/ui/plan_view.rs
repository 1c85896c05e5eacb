//! Plan rendering (C8, spec.md §4.8).

use std::io::{self, Write};

use crossterm::style::{Color, Stylize};

use crate::plan::{Action, ComposeActionType, DirPlan, FilePlan, ProjectPlan, SyncPlan};

use super::terminal::TerminalCapabilities;

const ADD: Color = Color::Green;
const MODIFY: Color = Color::Yellow;
const DELETE: Color = Color::Red;
const INFO: Color = Color::Cyan;
const DIM: Color = Color::DarkGrey;

/// Render a full plan: per-host header, per-project remote dir/post-sync
/// command/dirs/files, then the summary line spec.md §4.8 specifies:
/// `N host(s), M project(s) — A to add, B to modify, C to delete, D unchanged[, E dir(s) to create]`.
pub fn render_plan(plan: &SyncPlan, caps: &TerminalCapabilities, out: &mut dyn Write) -> io::Result<()> {
    let mut to_add = 0usize;
    let mut to_modify = 0usize;
    let mut to_delete = 0usize;
    let mut unchanged = 0usize;
    let mut dirs_to_create = 0usize;
    let mut project_count = 0usize;

    for host_plan in &plan.host_plans {
        writeln!(
            out,
            "{}",
            color(
                &format!(
                    "{} ({}@{}:{})",
                    host_plan.host.name, host_plan.host.user, host_plan.host.host, host_plan.host.port
                ),
                INFO,
                caps
            )
        )?;

        for project in &host_plan.projects {
            render_project(project, caps, out)?;
            project_count += 1;
            for dir in &project.dirs {
                if !dir.exists {
                    dirs_to_create += 1;
                }
            }
            for file in &project.files {
                match file.action {
                    Action::Add => to_add += 1,
                    Action::Modify => to_modify += 1,
                    Action::Delete => to_delete += 1,
                    Action::Unchanged => unchanged += 1,
                }
            }
        }
    }

    writeln!(out)?;
    if to_add == 0 && to_modify == 0 && to_delete == 0 && dirs_to_create == 0 {
        writeln!(out, "No changes. Your infrastructure matches the configuration.")?;
    } else {
        write!(
            out,
            "Summary: {} host(s), {project_count} project(s) — {to_add} to add, {to_modify} to modify, {to_delete} to delete, {unchanged} unchanged",
            plan.host_plans.len()
        )?;
        if dirs_to_create > 0 {
            write!(out, ", {dirs_to_create} dir(s) to create")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn render_project(project: &ProjectPlan, caps: &TerminalCapabilities, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "  project {} -> {}", project.project_name, project.remote_dir.display())?;
    if !project.post_sync_command.is_empty() {
        writeln!(out, "    postSyncCommand: {}", project.post_sync_command)?;
    }

    for dir in &project.dirs {
        render_dir(dir, caps, out)?;
    }
    for file in &project.files {
        render_file(file, caps, out)?;
    }
    if let Some(compose) = &project.compose {
        render_compose(compose, caps, out)?;
    }
    Ok(())
}

fn render_dir(dir: &DirPlan, caps: &TerminalCapabilities, out: &mut dyn Write) -> io::Result<()> {
    if dir.exists {
        writeln!(out, "    {} {}/ (exists)", color("=", DIM, caps), dir.relative_path)
    } else {
        writeln!(out, "    {} {}/ (create)", color("+", ADD, caps), dir.relative_path)
    }
}

fn render_file(file: &FilePlan, caps: &TerminalCapabilities, out: &mut dyn Write) -> io::Result<()> {
    let (symbol, tone) = match file.action {
        Action::Unchanged => return Ok(()),
        Action::Add => ("+", ADD),
        Action::Modify => ("~", MODIFY),
        Action::Delete => ("-", DELETE),
    };
    let label = match file.action {
        Action::Add => format!("new, {} B", file.local_data.len()),
        Action::Modify => format!("modified, {} B", file.local_data.len()),
        Action::Delete => "deleted".to_string(),
        Action::Unchanged => unreachable!(),
    };
    writeln!(
        out,
        "    {} {} ({})",
        color(symbol, tone, caps),
        file.relative_path,
        label
    )?;
    if let Some(diff) = &file.diff {
        for line in diff.lines() {
            writeln!(out, "      {}", color(line, DIM, caps))?;
        }
    }
    Ok(())
}

fn render_compose(compose: &crate::plan::ComposePlan, caps: &TerminalCapabilities, out: &mut dyn Write) -> io::Result<()> {
    let (symbol, tone, label) = match compose.action_type {
        ComposeActionType::NoChange => return Ok(()),
        ComposeActionType::StartServices => ("+", ADD, "start services"),
        ComposeActionType::StopServices => ("-", DELETE, "stop services"),
    };
    writeln!(out, "    {} compose: {label}", color(symbol, tone, caps))
}

fn color(text: &str, tone: Color, caps: &TerminalCapabilities) -> String {
    if caps.supports_color {
        format!("{}", text.with(tone))
    } else {
        text.to_string()
    }
}
