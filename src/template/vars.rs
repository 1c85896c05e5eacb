//! Template variable sources (C5, spec.md §4.5).

use std::collections::BTreeMap;
use std::path::Path;

use crate::config::loader::host_project_dir;
use crate::error::CmtResult;

/// Load template variables for `(host, project)` by iterating `sources` in
/// order, each a glob relative to `hosts/<host>/<project>/`. Later files
/// override earlier files on key collision. Missing files are silent.
pub fn load_template_vars(
    base_path: &Path,
    host: &str,
    project: &str,
    sources: &[String],
) -> CmtResult<BTreeMap<String, String>> {
    let mut vars = BTreeMap::new();
    let root = host_project_dir(base_path, host, project);

    for source in sources {
        let pattern = root.join(source);
        let Some(pattern_str) = pattern.to_str() else {
            continue;
        };
        let Ok(paths) = glob::glob(pattern_str) else {
            continue;
        };

        let mut matched: Vec<_> = paths.flatten().filter(|p| p.is_file()).collect();
        matched.sort();

        for path in matched {
            let Ok(content) = std::fs::read_to_string(&path) else {
                continue;
            };
            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or_default()
                .to_ascii_lowercase();

            if ext == "yml" || ext == "yaml" {
                if let Ok(map) = serde_yaml_ng::from_str::<BTreeMap<String, serde_yaml_ng::Value>>(&content) {
                    for (k, v) in map {
                        vars.insert(k, scalar_to_string(&v));
                    }
                }
            } else {
                for (k, v) in parse_dotenv(&content) {
                    vars.insert(k, v);
                }
            }
        }
    }

    Ok(vars)
}

fn scalar_to_string(value: &serde_yaml_ng::Value) -> String {
    match value {
        serde_yaml_ng::Value::String(s) => s.clone(),
        serde_yaml_ng::Value::Bool(b) => b.to_string(),
        serde_yaml_ng::Value::Number(n) => n.to_string(),
        serde_yaml_ng::Value::Null => String::new(),
        other => serde_yaml_ng::to_string(other).unwrap_or_default().trim().to_string(),
    }
}

/// Parse `KEY=VALUE` lines, ignoring blank lines and `#` comments. Strips
/// one matching pair of surrounding `"` or `'`.
fn parse_dotenv(content: &str) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim().to_string();
        let mut value = value.trim().to_string();
        if value.len() >= 2 {
            let bytes = value.as_bytes();
            let first = bytes[0];
            let last = bytes[bytes.len() - 1];
            if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
                value = value[1..value.len() - 1].to_string();
            }
        }
        out.insert(key, value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &std::path::Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn yaml_source_becomes_flat_variables() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("hosts/server1/grafana/env.secrets.yml"),
            "smtp_password: s3cret\n",
        );
        let vars = load_template_vars(dir.path(), "server1", "grafana", &["*.yml".into()]).unwrap();
        assert_eq!(vars.get("smtp_password"), Some(&"s3cret".to_string()));
    }

    #[test]
    fn dotenv_source_parses_key_value_lines() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("hosts/server1/grafana/extra.env"),
            "# comment\n\nFOO=\"bar baz\"\nBAZ='qux'\n",
        );
        let vars =
            load_template_vars(dir.path(), "server1", "grafana", &["*.env".into()]).unwrap();
        assert_eq!(vars.get("FOO"), Some(&"bar baz".to_string()));
        assert_eq!(vars.get("BAZ"), Some(&"qux".to_string()));
    }

    #[test]
    fn later_source_overrides_earlier_on_collision() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("hosts/server1/grafana/a.yml"),
            "key: first\n",
        );
        write(
            &dir.path().join("hosts/server1/grafana/b.yml"),
            "key: second\n",
        );
        let vars = load_template_vars(
            dir.path(),
            "server1",
            "grafana",
            &["a.yml".into(), "b.yml".into()],
        )
        .unwrap();
        assert_eq!(vars.get("key"), Some(&"second".to_string()));
    }

    #[test]
    fn missing_sources_are_silent() {
        let dir = tempfile::tempdir().unwrap();
        let vars =
            load_template_vars(dir.path(), "server1", "grafana", &["*.yml".into()]).unwrap();
        assert!(vars.is_empty());
    }
}
