//! `xata pull` command - Pull branch migrations into the local directory.

use crate::cli::{GlobalArgs, PullArgs};
use crate::commands::Context;
use crate::error::CliResult;
use crate::output::{self, success};

/// Run the pull command
pub async fn run(global: &GlobalArgs, args: PullArgs) -> CliResult<()> {
    output::header("Pull");

    let ctx = Context::load(global)?;
    ctx.print_target();

    if args.force {
        output::warn("Replacing local migrations with the branch history");
    }

    let outcome = ctx.reconciler().pull(args.force).await?;

    if !outcome.has_changes() {
        output::info(&outcome.summary());
        return Ok(());
    }

    for id in &outcome.written {
        output::list_item(id);
    }
    output::newline();
    success(&outcome.summary());
    Ok(())
}
