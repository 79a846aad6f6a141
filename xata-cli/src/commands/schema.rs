//! `xata schema` commands - Inspect the branch schema.

use crate::cli::{GlobalArgs, SchemaArgs, SchemaDumpArgs, SchemaSubcommand};
use crate::commands::Context;
use crate::error::CliResult;
use crate::output::{self, success};

/// Run the schema command
pub async fn run(global: &GlobalArgs, args: SchemaArgs) -> CliResult<()> {
    match args.command {
        SchemaSubcommand::Dump(dump_args) => run_dump(global, dump_args).await,
    }
}

/// Run `xata schema dump` - print or save the branch schema
async fn run_dump(global: &GlobalArgs, args: SchemaDumpArgs) -> CliResult<()> {
    let ctx = Context::load(global)?;
    let details = ctx.branch.details().await?;

    match args.file {
        None => output::json(&details.schema)?,
        Some(path) => {
            let mut content = serde_json::to_string_pretty(&details.schema)?;
            content.push('\n');
            tokio::fs::write(&path, content).await?;
            success(&format!("Schema written to {}", path.display()));
        }
    }

    Ok(())
}
