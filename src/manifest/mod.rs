//! Manifest (C6, spec.md §3, §4.6).
//!
//! A persistent record on the remote host listing files managed by cmt;
//! used to compute deletions.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CmtResult;
use crate::transport::RemoteClient;

pub const MANIFEST_FILE_NAME: &str = ".cmt-manifest.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(rename = "managedFiles")]
    pub managed_files: BTreeSet<String>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_relative_paths(paths: impl IntoIterator<Item = String>) -> Self {
        let mut managed_files: BTreeSet<String> = paths.into_iter().collect();
        managed_files.remove(MANIFEST_FILE_NAME);
        Self { managed_files }
    }

    pub fn contains(&self, relative_path: &str) -> bool {
        self.managed_files.contains(relative_path)
    }

    /// Serialize to the on-disk/on-wire format: UTF-8 JSON, indented two
    /// spaces, list sorted lexicographically (guaranteed by `BTreeSet`).
    pub fn to_json(&self) -> CmtResult<String> {
        let mut buf = Vec::new();
        let mut ser = serde_json::Serializer::with_formatter(
            &mut buf,
            serde_json::ser::PrettyFormatter::with_indent(b"  "),
        );
        serde::Serialize::serialize(self, &mut ser)?;
        Ok(String::from_utf8(buf).expect("json is utf-8"))
    }
}

/// Read the manifest at `<remote_dir>/.cmt-manifest.json`. Best-effort:
/// absence or invalid JSON is treated as an empty manifest, never an error
/// (spec.md §4.6).
pub fn read_manifest(client: &mut dyn RemoteClient, remote_dir: &Path) -> Manifest {
    let path = remote_dir.join(MANIFEST_FILE_NAME);
    let Ok(Some(bytes)) = client.read_file(&path) else {
        return Manifest::new();
    };
    serde_json::from_slice(&bytes).unwrap_or_default()
}

/// Write the manifest to `<remote_dir>/.cmt-manifest.json`.
pub fn write_manifest(
    client: &mut dyn RemoteClient,
    remote_dir: &Path,
    manifest: &Manifest,
) -> CmtResult<()> {
    let path = remote_dir.join(MANIFEST_FILE_NAME);
    let json = manifest.to_json()?;
    client.write_file(&path, json.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::FakeRemoteClient;
    use proptest::prelude::*;

    #[test]
    fn missing_manifest_reads_as_empty() {
        let mut client = FakeRemoteClient::new();
        let manifest = read_manifest(&mut client, Path::new("/srv/grafana"));
        assert!(manifest.managed_files.is_empty());
    }

    #[test]
    fn invalid_json_reads_as_empty() {
        let mut client = FakeRemoteClient::new()
            .with_file("/srv/grafana/.cmt-manifest.json", "not json");
        let manifest = read_manifest(&mut client, Path::new("/srv/grafana"));
        assert!(manifest.managed_files.is_empty());
    }

    #[test]
    fn from_relative_paths_excludes_manifest_itself_and_sorts() {
        let manifest = Manifest::from_relative_paths(vec![
            "b.txt".to_string(),
            "a.txt".to_string(),
            MANIFEST_FILE_NAME.to_string(),
        ]);
        let list: Vec<_> = manifest.managed_files.iter().cloned().collect();
        assert_eq!(list, vec!["a.txt".to_string(), "b.txt".to_string()]);
    }

    #[test]
    fn round_trips_through_json() {
        let manifest = Manifest::from_relative_paths(vec!["compose.yml".to_string()]);
        let json = manifest.to_json().unwrap();
        assert!(json.contains("managedFiles"));
        let mut client = FakeRemoteClient::new();
        write_manifest(&mut client, Path::new("/srv/grafana"), &manifest).unwrap();
        let read_back = read_manifest(&mut client, Path::new("/srv/grafana"));
        assert_eq!(read_back, manifest);
    }

    proptest::proptest! {
        /// P5 supplement: a manifest built from any set of relative paths
        /// always round-trips through JSON with the manifest's own name
        /// excluded and the remainder sorted, regardless of input order or
        /// duplicates.
        #[test]
        fn from_relative_paths_round_trips_for_any_input(
            mut paths in proptest::collection::vec("[a-z0-9/._-]{1,16}", 0..12)
        ) {
            let manifest = Manifest::from_relative_paths(paths.clone());
            let json = manifest.to_json().unwrap();
            let reparsed: Manifest = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(reparsed.clone(), manifest);
            prop_assert!(!reparsed.managed_files.contains(MANIFEST_FILE_NAME));

            paths.retain(|p| p != MANIFEST_FILE_NAME);
            let expected: std::collections::BTreeSet<_> = paths.into_iter().collect();
            prop_assert_eq!(reparsed.managed_files, expected);
        }
    }
}
