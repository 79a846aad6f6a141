//! Xata CLI - Command-line interface for Xata databases.

use clap::Parser;
use miette::Diagnostic;

use xata_cli::cli::{Cli, Command};
use xata_cli::commands;
use xata_cli::error::CliResult;
use xata_cli::output;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.global.verbose {
        xata_client::logging::init_with_level("debug");
    } else {
        xata_client::logging::init();
    }

    if let Err(e) = run(cli).await {
        output::newline();
        output::error(&e.to_string());
        if let Some(help) = e.help() {
            output::hint(&help.to_string());
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let global = cli.global;

    match cli.command {
        Command::Push(args) => commands::push::run(&global, args).await,
        Command::Pull(args) => commands::pull::run(&global, args).await,
        Command::Schema(args) => commands::schema::run(&global, args).await,
        Command::Version => commands::version::run().await,
    }
}
