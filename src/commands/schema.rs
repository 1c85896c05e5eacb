use anyhow::Result;

use crate::cli::SchemaKind;
use crate::config::{CmtConfig, HookConfig, HostConfig};

pub fn cmd_schema(kind: SchemaKind) -> Result<()> {
    let schema = match kind {
        SchemaKind::Cmt => schemars::schema_for!(CmtConfig),
        SchemaKind::Host => schemars::schema_for!(HostConfig),
        SchemaKind::HookBeforePlan | SchemaKind::HookBeforeApplyPrompt | SchemaKind::HookBeforeApply => {
            schemars::schema_for!(HookConfig)
        }
    };
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
