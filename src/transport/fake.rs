//! In-memory test double for `RemoteClient`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::CmtResult;

use super::{DirMetadata, RemoteClient};

#[derive(Default)]
pub struct FakeRemoteClient {
    pub files: Mutex<BTreeMap<PathBuf, Vec<u8>>>,
    pub dirs: Mutex<std::collections::BTreeSet<PathBuf>>,
    pub dir_metadata: Mutex<BTreeMap<PathBuf, DirMetadata>>,
    pub commands_run: Mutex<Vec<(PathBuf, String)>>,
}

impl FakeRemoteClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) -> Self {
        self.files.lock().unwrap().insert(path.into(), content.into());
        self
    }

    pub fn with_dir(self, path: impl Into<PathBuf>) -> Self {
        self.dirs.lock().unwrap().insert(path.into());
        self
    }
}

impl RemoteClient for FakeRemoteClient {
    fn read_file(&mut self, path: &Path) -> CmtResult<Option<Vec<u8>>> {
        Ok(self.files.lock().unwrap().get(path).cloned())
    }

    fn write_file(&mut self, path: &Path, content: &[u8]) -> CmtResult<()> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), content.to_vec());
        Ok(())
    }

    fn mkdir_all(&mut self, path: &Path) -> CmtResult<()> {
        self.dirs.lock().unwrap().insert(path.to_path_buf());
        Ok(())
    }

    fn remove(&mut self, path: &Path) -> CmtResult<()> {
        self.files.lock().unwrap().remove(path);
        Ok(())
    }

    fn stat(&mut self, path: &Path) -> CmtResult<bool> {
        Ok(self.files.lock().unwrap().contains_key(path)
            || self.dirs.lock().unwrap().contains(path))
    }

    fn stat_dir_metadata(&mut self, path: &Path) -> CmtResult<Option<DirMetadata>> {
        if !self.dirs.lock().unwrap().contains(path) {
            return Ok(None);
        }
        Ok(Some(
            self.dir_metadata
                .lock()
                .unwrap()
                .get(path)
                .cloned()
                .unwrap_or_default(),
        ))
    }

    fn list_files_recursive(&mut self, path: &Path) -> CmtResult<Vec<String>> {
        let files = self.files.lock().unwrap();
        let mut out: Vec<String> = files
            .keys()
            .filter_map(|p| p.strip_prefix(path).ok())
            .map(|p| p.to_string_lossy().to_string())
            .collect();
        out.sort();
        Ok(out)
    }

    fn run_command(&mut self, workdir: &Path, command: &str) -> CmtResult<String> {
        self.commands_run
            .lock()
            .unwrap()
            .push((workdir.to_path_buf(), command.to_string()));
        Ok(String::new())
    }

    fn close(self: Box<Self>) -> CmtResult<()> {
        Ok(())
    }
}
