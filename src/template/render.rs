//! Template rendering (C5, spec.md §4.5, §9).
//!
//! Implements the `{{ .Key }}` subset of Go text/template with strict
//! missing-key-as-error semantics. `tera`/`minijinja` use non-dotted Jinja
//! syntax with permissive undefined-variable defaults that would silently
//! change the rendered output, so this one piece of format-specific syntax
//! is hand-written instead of reached for from a generic templating crate.

use std::collections::BTreeMap;

use crate::error::{CmtError, CmtResult};

const BINARY_PROBE_WINDOW: usize = 8192;

/// Render `data` against `vars`. Binary data (NUL byte in the first 8 KiB)
/// and an empty `vars` map both short-circuit to `data` unchanged
/// (spec.md §4.5, P6).
pub fn render_template(data: &[u8], vars: &BTreeMap<String, String>, path: &str) -> CmtResult<Vec<u8>> {
    let probe_len = data.len().min(BINARY_PROBE_WINDOW);
    if data[..probe_len].contains(&0u8) {
        return Ok(data.to_vec());
    }

    if vars.is_empty() {
        return Ok(data.to_vec());
    }

    let text = String::from_utf8_lossy(data);
    let rendered = render_str(&text, vars, path)?;
    Ok(rendered.into_bytes())
}

fn render_str(text: &str, vars: &BTreeMap<String, String>, path: &str) -> CmtResult<String> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    loop {
        match rest.find("{{") {
            None => {
                out.push_str(rest);
                break;
            }
            Some(start) => {
                out.push_str(&rest[..start]);
                let after_open = &rest[start + 2..];
                let Some(end) = after_open.find("}}") else {
                    return Err(CmtError::Template {
                        path: path.to_string(),
                        message: "unclosed '{{' action".to_string(),
                    });
                };
                let inner = after_open[..end].trim();
                let key = parse_field_access(inner).ok_or_else(|| CmtError::Template {
                    path: path.to_string(),
                    message: format!("unsupported template action: {{{{ {inner} }}}}"),
                })?;

                let value = vars.get(key).ok_or_else(|| CmtError::TemplateMissingKey {
                    path: path.to_string(),
                    key: key.to_string(),
                })?;
                out.push_str(value);

                rest = &after_open[end + 2..];
            }
        }
    }

    Ok(out)
}

/// Parse the `.Key` field-access subset. Returns `None` for anything else
/// (pipelines, function calls, nested fields), which surfaces as a syntax
/// error to the caller.
fn parse_field_access(inner: &str) -> Option<&str> {
    let key = inner.strip_prefix('.')?;
    if key.is_empty() || !key.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }
    Some(key)
}
