//! `xata push` command - Push local migrations to a branch.

use xata_migrate::MigrationMode;

use crate::cli::{GlobalArgs, PushArgs};
use crate::commands::Context;
use crate::error::CliResult;
use crate::output::{self, success};

/// Run the push command
pub async fn run(global: &GlobalArgs, args: PushArgs) -> CliResult<()> {
    output::header("Push");

    let ctx = Context::load(global)?;
    ctx.print_target();
    let reconciler = ctx.reconciler();

    output::step(1, 2, "Comparing local migrations with branch history...");
    let plan = reconciler.plan_push().await?;

    if plan.is_empty() {
        output::newline();
        output::info("No new migrations to push");
        return Ok(());
    }

    output::kv("Mode", plan.mode);
    for migration in &plan.migrations {
        output::list_item(migration.id());
    }

    if args.dry_run {
        output::newline();
        output::info(&format!(
            "Dry run: {} migrations would be pushed to {}",
            plan.migrations.len(),
            ctx.settings.branch
        ));
        return Ok(());
    }

    output::step(2, 2, "Submitting migrations...");
    let outcome = reconciler.execute(&plan).await?;

    if outcome.mode == MigrationMode::PgRoll {
        for (name, job) in outcome.pushed.iter().zip(&outcome.jobs) {
            output::list_item(&format!("{} started job {}", name, job));
        }
    }

    output::newline();
    success(&outcome.summary());
    Ok(())
}
