//! Remote transport capability (C3, spec.md §4.3).
//!
//! `RemoteClient` abstracts the connection-shell + file-copy program so the
//! reconciliation engine is unit-testable without a real SSH connection: a
//! narrow capability trait, one production adapter shelling to `ssh`, one
//! in-memory test double.

pub mod fake;
pub mod ssh_client;

use std::path::Path;

use crate::config::HostEntry;
use crate::error::CmtResult;

pub use fake::FakeRemoteClient;
pub use ssh_client::SshRemoteClient;

/// Parsed `stat`-like directory metadata (spec.md §4.3, §5 supplement).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DirMetadata {
    pub permission: Option<String>,
    pub owner: Option<String>,
    pub group: Option<String>,
}

/// Capability interface for one open connection to a remote host.
///
/// All operations are synchronous and blocking from the caller's
/// viewpoint (spec.md §5 — "strictly single-threaded, sequential").
pub trait RemoteClient {
    /// Read a remote file's bytes. `Ok(None)` means the file does not exist.
    fn read_file(&mut self, path: &Path) -> CmtResult<Option<Vec<u8>>>;

    /// Write bytes to a remote path, creating parent directories first.
    /// Atomic from the caller's perspective.
    fn write_file(&mut self, path: &Path, content: &[u8]) -> CmtResult<()>;

    /// Create a directory and all of its parents.
    fn mkdir_all(&mut self, path: &Path) -> CmtResult<()>;

    /// Remove a file (or empty directory). Not an error if already absent.
    fn remove(&mut self, path: &Path) -> CmtResult<()>;

    /// Boolean existence check.
    fn stat(&mut self, path: &Path) -> CmtResult<bool>;

    /// Parse directory permission/owner/group metadata.
    fn stat_dir_metadata(&mut self, path: &Path) -> CmtResult<Option<DirMetadata>>;

    /// List all files under `path`, recursively, as paths relative to `path`.
    fn list_files_recursive(&mut self, path: &Path) -> CmtResult<Vec<String>>;

    /// Run a command with `workdir` as the current directory. Returns
    /// combined stdout+stderr on success; error includes the same combined
    /// output on failure (spec.md §4.3, §7).
    fn run_command(&mut self, workdir: &Path, command: &str) -> CmtResult<String>;

    fn close(self: Box<Self>) -> CmtResult<()>;
}

/// Capability: open a `RemoteClient` for a resolved `HostEntry`.
pub trait ClientFactory {
    fn connect(&self, entry: &HostEntry) -> CmtResult<Box<dyn RemoteClient>>;
}

/// Production factory, connecting over `ssh`/`scp`-equivalent commands.
pub struct SshClientFactory;

impl ClientFactory for SshClientFactory {
    fn connect(&self, entry: &HostEntry) -> CmtResult<Box<dyn RemoteClient>> {
        Ok(Box::new(SshRemoteClient::new(entry.clone())))
    }
}

/// Shell-quote a path for safe interpolation into a remote command string.
pub fn quote_path(path: &Path) -> String {
    format!("'{}'", path.to_string_lossy().replace('\'', "'\\''"))
}
