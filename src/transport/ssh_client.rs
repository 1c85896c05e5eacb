//! Production `RemoteClient`: one `ssh <dest> <command>` invocation per
//! operation, combined stdout+stderr captured on failure.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::config::HostEntry;
use crate::error::{CmtError, CmtResult};

use super::{quote_path, DirMetadata, RemoteClient};

pub struct SshRemoteClient {
    entry: HostEntry,
}

impl SshRemoteClient {
    pub fn new(entry: HostEntry) -> Self {
        Self { entry }
    }

    fn destination(&self) -> String {
        if self.entry.user.is_empty() {
            self.entry.host.clone()
        } else {
            format!("{}@{}", self.entry.user, self.entry.host)
        }
    }

    fn run(&self, command: &str, input: Option<&[u8]>) -> CmtResult<String> {
        let mut cmd = Command::new("ssh");
        if self.entry.port != 0 && self.entry.port != 22 {
            cmd.arg("-p").arg(self.entry.port.to_string());
        }
        for identity in &self.entry.identity_files {
            cmd.arg("-i").arg(identity);
        }
        cmd.arg(self.destination()).arg(command);
        cmd.stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| CmtError::Transport {
            host: self.entry.name.clone(),
            path: command.to_string(),
            message: format!("failed to spawn ssh: {e}"),
        })?;

        if let Some(input) = input {
            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(input).map_err(|e| CmtError::Transport {
                    host: self.entry.name.clone(),
                    path: command.to_string(),
                    message: e.to_string(),
                })?;
            }
        }

        let output = child.wait_with_output().map_err(|e| CmtError::Transport {
            host: self.entry.name.clone(),
            path: command.to_string(),
            message: e.to_string(),
        })?;

        let combined = format!(
            "{}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );

        if !output.status.success() {
            return Err(CmtError::Transport {
                host: self.entry.name.clone(),
                path: command.to_string(),
                message: combined,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl RemoteClient for SshRemoteClient {
    fn read_file(&mut self, path: &Path) -> CmtResult<Option<Vec<u8>>> {
        let exists = self.stat(path)?;
        if !exists {
            return Ok(None);
        }
        let content = self.run(&format!("cat {}", quote_path(path)), None)?;
        Ok(Some(content.into_bytes()))
    }

    fn write_file(&mut self, path: &Path, content: &[u8]) -> CmtResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                self.mkdir_all(parent)?;
            }
        }
        let p = quote_path(path);
        let tmp = format!("{p}.cmt-tmp");
        self.run(&format!("cat > {tmp}"), Some(content))?;
        self.run(&format!("mv -f {tmp} {p}"), None)?;
        Ok(())
    }

    fn mkdir_all(&mut self, path: &Path) -> CmtResult<()> {
        self.run(&format!("mkdir -p {}", quote_path(path)), None)?;
        Ok(())
    }

    fn remove(&mut self, path: &Path) -> CmtResult<()> {
        self.run(&format!("rm -f {}", quote_path(path)), None)?;
        Ok(())
    }

    fn stat(&mut self, path: &Path) -> CmtResult<bool> {
        let command = format!("test -e {} && echo 1 || echo 0", quote_path(path));
        let output = self.run(&command, None)?;
        Ok(output.trim() == "1")
    }

    fn stat_dir_metadata(&mut self, path: &Path) -> CmtResult<Option<DirMetadata>> {
        if !self.stat(path)? {
            return Ok(None);
        }
        let p = quote_path(path);
        let command = format!(
            "stat -c '%a %U %G' {p} 2>/dev/null || stat -f '%Lp %Su %Sg' {p}"
        );
        let output = self.run(&command, None)?;
        let mut parts = output.trim().splitn(3, ' ');
        Ok(Some(DirMetadata {
            permission: parts.next().map(str::to_string),
            owner: parts.next().map(str::to_string),
            group: parts.next().map(str::to_string),
        }))
    }

    fn list_files_recursive(&mut self, path: &Path) -> CmtResult<Vec<String>> {
        if !self.stat(path)? {
            return Ok(Vec::new());
        }
        let p = quote_path(path);
        let command = format!("cd {p} && find . -type f | sed 's|^\\./||'");
        let output = self.run(&command, None)?;
        Ok(output
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn run_command(&mut self, workdir: &Path, command: &str) -> CmtResult<String> {
        let full = format!("cd {} && {}", quote_path(workdir), command);
        self.run(&full, None)
    }

    fn close(self: Box<Self>) -> CmtResult<()> {
        Ok(())
    }
}
