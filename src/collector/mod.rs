//! File collector (C4, spec.md §4.4).
//!
//! Builds the deterministic `relative-path -> absolute-local-path` set for a
//! (host, project), with host-level files overriding project-level files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::loader::{host_project_dir, project_dir};

/// Collect the file set for `(host, project)` under `base_path`, per the
/// 5-step overlay order in spec.md §4.4. Missing directories and missing
/// base files are silent.
pub fn collect_files(base_path: &Path, host: &str, project: &str) -> BTreeMap<String, PathBuf> {
    let mut files: BTreeMap<String, PathBuf> = BTreeMap::new();
    let project_root = project_dir(base_path, project);
    let host_project_root = host_project_dir(base_path, host, project);

    // 1. projects/<project>/compose.yml
    let compose = project_root.join("compose.yml");
    if compose.is_file() {
        files.insert("compose.yml".to_string(), compose);
    }

    // 2. projects/<project>/files/**/*
    insert_tree(&mut files, &project_root.join("files"));

    // 3. hosts/<host>/<project>/compose.override.yml
    let override_file = host_project_root.join("compose.override.yml");
    if override_file.is_file() {
        files.insert("compose.override.yml".to_string(), override_file);
    }

    // 4. hosts/<host>/<project>/.env
    let env_file = host_project_root.join(".env");
    if env_file.is_file() {
        files.insert(".env".to_string(), env_file);
    }

    // 5. hosts/<host>/<project>/files/**/*
    insert_tree(&mut files, &host_project_root.join("files"));

    files
}

/// Walk `root` recursively, inserting `relative/subtree/path -> absolute`
/// entries. Silent if `root` doesn't exist.
fn insert_tree(files: &mut BTreeMap<String, PathBuf>, root: &Path) {
    if !root.is_dir() {
        return;
    }
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.is_file() {
                if let Ok(rel) = path.strip_prefix(root) {
                    let key = rel.to_string_lossy().replace('\\', "/");
                    files.insert(key, path);
                }
            }
        }
    }
}
