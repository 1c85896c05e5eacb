//! Lifecycle hooks (C10, spec.md §4.10, §6).
//!
//! Each of the three slots (`beforePlan`, `beforeApplyPrompt`, `beforeApply`)
//! is an externally configured shell command invoked with a JSON payload on
//! stdin; the exit code decides whether the apply continues.

use std::io::Write;
use std::process::{Command, Stdio};

use serde::Serialize;

use crate::config::HookConfig;
use crate::error::{CmtError, CmtResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    Continue,
    Reject,
}

/// JSON payload written to the hook's stdin (spec.md §6):
/// `{hosts: [name…], workingDir: <absolute path>, paths: {configPath, basePath}}`.
#[derive(Debug, Clone, Serialize)]
pub struct HookPayload {
    pub hosts: Vec<String>,
    #[serde(rename = "workingDir")]
    pub working_dir: String,
    pub paths: HookPaths,
}

#[derive(Debug, Clone, Serialize)]
pub struct HookPaths {
    #[serde(rename = "configPath")]
    pub config_path: String,
    #[serde(rename = "basePath")]
    pub base_path: String,
}

/// Run `hook`'s command with `payload` on stdin via `sh -c`, capturing
/// combined stdout+stderr. Exit code `0` continues, `1` rejects, anything
/// else (including spawn failure) is an error (spec.md §4.10).
pub fn run_hook(name: &str, hook: &HookConfig, payload: &HookPayload) -> CmtResult<(HookOutcome, String)> {
    let json = serde_json::to_vec(payload)?;

    let mut child = Command::new("sh")
        .arg("-c")
        .arg(&hook.command)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| CmtError::Hook {
            name: name.to_string(),
            message: format!("failed to spawn: {e}"),
        })?;

    if let Some(mut stdin) = child.stdin.take() {
        let _ = stdin.write_all(&json);
    }

    let output = child.wait_with_output().map_err(|e| CmtError::Hook {
        name: name.to_string(),
        message: e.to_string(),
    })?;

    let combined = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );

    match output.status.code() {
        Some(0) => Ok((HookOutcome::Continue, combined)),
        Some(1) => Ok((HookOutcome::Reject, combined)),
        _ => Err(CmtError::Hook {
            name: name.to_string(),
            message: combined,
        }),
    }
}

/// Indent each line of `output` by two spaces for display under a hook's
/// name (mirrors the shape of the transport's combined-output capture).
pub fn indent(output: &str) -> String {
    output
        .lines()
        .map(|line| format!("  {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}
