//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Xata CLI - Manage Xata databases from the terminal
#[derive(Parser, Debug)]
#[command(name = "xata")]
#[command(author = "Pegasus Heavy Industries LLC")]
#[command(version)]
#[command(about = "Xata CLI - Manage Xata databases from the terminal", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Options shared by every command
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Options accepted by every command
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Database URL (https://{workspace}.{region}.xata.sh/db/{database})
    #[arg(long, global = true, env = "XATA_DATABASE_URL")]
    pub db: Option<String>,

    /// Branch to operate on
    #[arg(long, global = true, env = "XATA_BRANCH")]
    pub branch: Option<String>,

    /// API key
    #[arg(long, global = true, env = "XATA_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Path to the config file (defaults to ./xata.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding local migrations
    #[arg(long, global = true)]
    pub migrations_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Push local migrations to a branch
    Push(PushArgs),

    /// Pull migrations from a branch into the local directory
    Pull(PullArgs),

    /// Branch schema commands
    Schema(SchemaArgs),

    /// Display version information
    Version,
}

// =============================================================================
// Push Command
// =============================================================================

/// Arguments for the `push` command
#[derive(Args, Debug, Default)]
pub struct PushArgs {
    /// Show what would be pushed without submitting anything
    #[arg(long)]
    pub dry_run: bool,
}

// =============================================================================
// Pull Command
// =============================================================================

/// Arguments for the `pull` command
#[derive(Args, Debug, Default)]
pub struct PullArgs {
    /// Replace local migrations with the branch history, converting their format
    #[arg(short, long)]
    pub force: bool,
}

// =============================================================================
// Schema Command
// =============================================================================

/// Arguments for the `schema` command
#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Schema subcommand
    #[command(subcommand)]
    pub command: SchemaSubcommand,
}

/// Schema subcommands
#[derive(Subcommand, Debug)]
pub enum SchemaSubcommand {
    /// Dump the schema as JSON
    Dump(SchemaDumpArgs),
}

/// Arguments for `schema dump`
#[derive(Args, Debug, Default)]
pub struct SchemaDumpArgs {
    /// File to write the schema to
    #[arg(short, long)]
    pub file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_pull_force() {
        let cli = Cli::try_parse_from(["xata", "pull", "-f", "--branch", "dev"]).unwrap();
        assert_eq!(cli.global.branch.as_deref(), Some("dev"));
        assert!(matches!(cli.command, Command::Pull(PullArgs { force: true })));
    }

    #[test]
    fn test_parse_schema_dump() {
        let cli = Cli::try_parse_from(["xata", "schema", "dump", "--file", "schema.json"]).unwrap();
        match cli.command {
            Command::Schema(SchemaArgs {
                command: SchemaSubcommand::Dump(args),
            }) => assert_eq!(args.file, Some(PathBuf::from("schema.json"))),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
