//! Error types for cmt
//!
//! Uses `thiserror` for the engine's library error type; CLI-boundary code
//! converts it into `anyhow::Error` via `?`/`Context`.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for cmt engine operations.
pub type CmtResult<T> = Result<T, CmtError>;

/// Main error type for the cmt reconciliation engine.
#[derive(Error, Debug)]
pub enum CmtError {
    #[error("config error: {0}")]
    Config(String),

    #[error("host '{host}' has no host.yml or it could not be parsed: {message}")]
    HostConfig { host: String, message: String },

    #[error("remotePath is empty for host '{host}' project '{project}' after merging config layers")]
    EmptyRemotePath { host: String, project: String },

    #[error("failed to resolve ssh parameters for host '{host}': {message}")]
    SshResolve { host: String, message: String },

    #[error("transport error on host '{host}' path '{path}': {message}")]
    Transport {
        host: String,
        path: String,
        message: String,
    },

    #[error("template error rendering '{path}': {message}")]
    Template { path: String, message: String },

    #[error("missing template variable '{key}' rendering '{path}'")]
    TemplateMissingKey { path: String, key: String },

    #[error("hook '{name}' failed: {message}")]
    Hook { name: String, message: String },

    #[error("compose command failed for host '{host}' project '{project}': {output}")]
    Compose {
        host: String,
        project: String,
        output: String,
    },

    #[error("invalid permission '{value}' for dir '{path}': must be octal")]
    InvalidPermission { path: String, value: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_includes_host_and_path() {
        let err = CmtError::Transport {
            host: "server1".into(),
            path: "/opt/apps/grafana/compose.yml".into(),
            message: "permission denied".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("server1"));
        assert!(msg.contains("compose.yml"));
        assert!(msg.contains("permission denied"));
    }

    #[test]
    fn missing_key_error_names_both_key_and_path() {
        let err = CmtError::TemplateMissingKey {
            path: "conf.ini".into(),
            key: "smtp_password".into(),
        };
        assert_eq!(
            err.to_string(),
            "missing template variable 'smtp_password' rendering 'conf.ini'"
        );
    }
}
