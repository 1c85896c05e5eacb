//! SSH parameter resolver (C2, spec.md §4.2).
//!
//! Polymorphic over `SSHConfigResolver` so the plan builder is unit-testable
//! without a real `ssh` binary: one narrow capability trait, one production
//! adapter, one in-memory test double.

use std::path::Path;
use std::process::Command;

use crate::config::HostEntry;
use crate::error::{CmtError, CmtResult};

/// Capability: resolve SSH connection parameters for a `HostEntry`.
pub trait SshConfigResolver {
    fn resolve(
        &self,
        entry: &HostEntry,
        ssh_config_path: Option<&Path>,
        host_dir: &Path,
    ) -> CmtResult<HostEntry>;
}

/// Production resolver: shells out to `ssh -G`.
pub struct SystemSshResolver;

impl SshConfigResolver for SystemSshResolver {
    fn resolve(
        &self,
        entry: &HostEntry,
        ssh_config_path: Option<&Path>,
        _host_dir: &Path,
    ) -> CmtResult<HostEntry> {
        let mut cmd = Command::new("ssh");
        cmd.arg("-G");
        if let Some(cfg) = ssh_config_path {
            cmd.arg("-F").arg(cfg);
        }
        if !entry.user.is_empty() {
            cmd.arg("-l").arg(&entry.user);
        }
        if entry.port != 0 {
            cmd.arg("-p").arg(entry.port.to_string());
        }
        cmd.arg(&entry.host);

        let output = cmd.output().map_err(|e| CmtError::SshResolve {
            host: entry.name.clone(),
            message: format!("failed to spawn ssh -G: {e}"),
        })?;

        if !output.status.success() {
            return Err(CmtError::SshResolve {
                host: entry.name.clone(),
                message: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        Ok(apply_ssh_g_output(entry, &stdout))
    }
}

/// Parse `ssh -G` output and overlay it onto `entry` per spec.md §4.2's
/// resolution rules. Exposed for use by both `SystemSshResolver` and tests
/// that feed synthetic output.
pub fn apply_ssh_g_output(entry: &HostEntry, ssh_g_stdout: &str) -> HostEntry {
    let mut resolved = entry.clone();
    let original_alias = entry.host.clone();

    let mut hostname: Option<String> = None;
    let mut user: Option<String> = None;
    let mut port: Option<String> = None;
    let mut proxy_command: Option<String> = None;
    let mut identity_files = Vec::new();
    let mut identity_agent: Option<String> = None;

    for line in ssh_g_stdout.lines() {
        let line = line.trim();
        let Some((key, value)) = line.split_once(' ') else {
            continue;
        };
        let key = key.to_lowercase();
        let value = value.trim();
        match key.as_str() {
            "hostname" => hostname = Some(value.to_string()),
            "user" => user = Some(value.to_string()),
            "port" => port = Some(value.to_string()),
            "proxycommand" => proxy_command = Some(value.to_string()),
            "identityfile" => identity_files.push(value.to_string()),
            "identityagent" => identity_agent = Some(value.to_string()),
            _ => {}
        }
    }

    // hostname always overrides the YAML `host` field.
    if let Some(hostname) = hostname {
        resolved.host = hostname;
    }

    // user/port fill only zero values; port finally defaults to 22.
    if resolved.user.is_empty() {
        if let Some(user) = user {
            resolved.user = user;
        }
    }
    if resolved.port == 0 {
        if let Some(port) = port.and_then(|p| p.parse::<u16>().ok()) {
            resolved.port = port;
        } else {
            resolved.port = 22;
        }
    }

    if let Some(proxy_command) = proxy_command {
        if proxy_command != "none" {
            resolved.proxy_command = Some(expand_placeholders(
                &proxy_command,
                &resolved,
                &original_alias,
            ));
        }
    }

    resolved.identity_files = identity_files
        .iter()
        .map(|f| {
            std::path::PathBuf::from(expand_placeholders(f, &resolved, &original_alias))
        })
        .collect();

    resolved.identity_agent = identity_agent;

    resolved
}

/// Expand `%h/%p/%r/%n/%%` placeholders against the *resolved* values, with
/// `%n` carrying the *original* alias (spec.md §4.2).
fn expand_placeholders(input: &str, resolved: &HostEntry, original_alias: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('h') => out.push_str(&resolved.host),
            Some('p') => out.push_str(&resolved.port.to_string()),
            Some('r') => out.push_str(&resolved.user),
            Some('n') => out.push_str(original_alias),
            Some('%') => out.push('%'),
            Some(other) => {
                out.push('%');
                out.push(other);
            }
            None => out.push('%'),
        }
    }
    out
}
