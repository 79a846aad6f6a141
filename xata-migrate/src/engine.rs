//! Push and pull between a local migrations directory and a branch.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::diff::diff_migrations;
use crate::error::{MigrateResult, MigrationError};
use crate::file::{LocalMigrationStore, check_id};
use crate::format::{detect_mode, validate_local_format};
use crate::history::{HistoryLoader, MigrationRemote, build_chain};
use crate::migration::{Migration, MigrationMode, MigrationRecord};

/// Result of a push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushOutcome {
    /// Target branch.
    pub branch: String,
    /// Branch migration mode.
    pub mode: MigrationMode,
    /// Identifiers submitted, in chain order.
    pub pushed: Vec<String>,
    /// pgroll job IDs, one per pushed migration. Empty for legacy pushes.
    pub jobs: Vec<String>,
}

impl PushOutcome {
    /// Check if anything was pushed.
    pub fn has_changes(&self) -> bool {
        !self.pushed.is_empty()
    }

    /// One-line summary for the user.
    pub fn summary(&self) -> String {
        if self.pushed.is_empty() {
            "No new migrations to push".to_string()
        } else {
            format!("Pushed {} migrations to {}", self.pushed.len(), self.branch)
        }
    }
}

/// Migrations a push would submit.
#[derive(Debug, Clone, PartialEq)]
pub struct PushPlan {
    /// Branch migration mode.
    pub mode: MigrationMode,
    /// Local-only migrations, in chain order.
    pub migrations: Vec<Migration>,
}

impl PushPlan {
    /// Check if there is nothing to push.
    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }
}

/// Result of a pull.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullOutcome {
    /// Source branch.
    pub branch: String,
    /// Branch migration mode.
    pub mode: MigrationMode,
    /// Identifiers written locally, in chain order.
    pub written: Vec<String>,
    /// Whether existing local files were replaced.
    pub replaced: bool,
}

impl PullOutcome {
    /// Check if anything was written.
    pub fn has_changes(&self) -> bool {
        !self.written.is_empty() || self.replaced
    }

    /// One-line summary for the user.
    pub fn summary(&self) -> String {
        if self.written.is_empty() && !self.replaced {
            "No new migrations to pull".to_string()
        } else {
            format!("Pulled {} migrations from {}", self.written.len(), self.branch)
        }
    }
}

/// Submit local-only migrations to the branch.
///
/// Legacy migrations go out as one batch. pgroll migrations start one job
/// each, in order; a job counts as pushed once accepted.
pub async fn execute_push<R>(
    remote: &R,
    mode: MigrationMode,
    migrations: &[Migration],
) -> MigrateResult<PushOutcome>
where
    R: MigrationRemote + ?Sized,
{
    let mut outcome = PushOutcome {
        branch: remote.branch().to_string(),
        mode,
        pushed: Vec::new(),
        jobs: Vec::new(),
    };

    if migrations.is_empty() {
        return Ok(outcome);
    }

    match mode {
        MigrationMode::Legacy => {
            let records = migrations
                .iter()
                .map(|migration| match migration {
                    Migration::Legacy(record) => Ok(record.clone()),
                    Migration::PgRoll(_) => Err(MigrationError::FormatMismatch(format!(
                        "Migration {} is in pgroll format but the branch does not use pgroll",
                        migration.id()
                    ))),
                })
                .collect::<MigrateResult<Vec<MigrationRecord>>>()?;

            let response = remote.push_migrations(&records).await?;
            if !response.is_completed() {
                return Err(MigrationError::submission(format!(
                    "remote reported status '{}'",
                    response.status
                )));
            }
            debug!(tip = %response.migration_id, "Legacy push completed");
            outcome.pushed = records.into_iter().map(|r| r.id).collect();
        }
        MigrationMode::PgRoll => {
            for migration in migrations {
                let Migration::PgRoll(pgroll) = migration else {
                    return Err(MigrationError::pgroll_required());
                };
                let payload = pgroll.payload().map_err(|e| {
                    MigrationError::corrupt(PathBuf::from(format!("{}.json", pgroll.name)), e.to_string())
                })?;

                let response = remote.pgroll_apply(&payload).await?;
                debug!(name = %pgroll.name, job = %response.job_id, "Started pgroll job");
                outcome.pushed.push(pgroll.name.clone());
                outcome.jobs.push(response.job_id);
            }
        }
    }

    Ok(outcome)
}

/// Reconciles a local migrations directory with one branch.
pub struct Reconciler<R> {
    remote: R,
    store: LocalMigrationStore,
    loader: HistoryLoader,
}

impl<R: MigrationRemote> Reconciler<R> {
    /// Create a reconciler.
    pub fn new(remote: R, store: LocalMigrationStore) -> Self {
        Self {
            remote,
            store,
            loader: HistoryLoader::default(),
        }
    }

    /// Use a custom history loader.
    pub fn with_loader(mut self, loader: HistoryLoader) -> Self {
        self.loader = loader;
        self
    }

    /// The remote branch.
    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// The local store.
    pub fn store(&self) -> &LocalMigrationStore {
        &self.store
    }

    /// Detect the branch mode and load its chain, root first.
    pub async fn remote_chain(&self) -> MigrateResult<(MigrationMode, Vec<Migration>)> {
        let details = self.remote.branch_details().await?;
        let mode = detect_mode(&details);
        let history = self.loader.load(&self.remote, mode).await?;
        let chain = build_chain(history)?;
        debug!(mode = %mode, migrations = chain.len(), "Loaded remote chain");
        Ok((mode, chain))
    }

    /// Work out which local migrations a push would submit.
    pub async fn plan_push(&self) -> MigrateResult<PushPlan> {
        let details = self.remote.branch_details().await?;
        let mode = detect_mode(&details);

        let local = self.store.load_chain().await?;
        validate_local_format(&local, mode)?;

        let remote = build_chain(self.loader.load(&self.remote, mode).await?)?;
        let migrations = diff_migrations(&remote, &local)?;
        debug!(mode = %mode, new = migrations.len(), "Planned push");
        Ok(PushPlan { mode, migrations })
    }

    /// Push local-only migrations to the branch.
    ///
    /// Nothing is submitted unless the format check and the diff succeed.
    pub async fn push(&self) -> MigrateResult<PushOutcome> {
        let plan = self.plan_push().await?;
        self.execute(&plan).await
    }

    /// Submit a plan from [`plan_push`](Self::plan_push).
    pub async fn execute(&self, plan: &PushPlan) -> MigrateResult<PushOutcome> {
        let outcome = execute_push(&self.remote, plan.mode, &plan.migrations).await?;
        info!(
            branch = %outcome.branch,
            mode = %plan.mode,
            pushed = outcome.pushed.len(),
            "Push finished"
        );
        Ok(outcome)
    }

    /// Bring remote migrations into the local directory.
    ///
    /// With `force`, local files are replaced by the remote chain, which also
    /// converts them to the branch's format. Otherwise only remote migrations
    /// past the end of the local chain are written, and a local chain that is
    /// ahead of the branch is left as it is.
    pub async fn pull(&self, force: bool) -> MigrateResult<PullOutcome> {
        let (mode, remote) = self.remote_chain().await?;
        for migration in &remote {
            check_id(migration.id()).map_err(MigrationError::invalid_history)?;
        }

        let written: Vec<Migration> = if force {
            self.store.replace_all(&remote).await?;
            remote
        } else {
            let local = self.store.load_chain().await?;
            validate_local_format(&local, mode)?;
            let new = diff_migrations(&local, &remote).map_err(|e| self.force_hint(e))?;
            if !new.is_empty() {
                for migration in &new {
                    self.store.write_migration(migration).await?;
                }
                let ids: Vec<&str> = remote.iter().map(Migration::id).collect();
                self.store.write_ledger(&ids).await?;
            }
            new
        };

        let outcome = PullOutcome {
            branch: self.remote.branch().to_string(),
            mode,
            written: written.iter().map(|m| m.id().to_string()).collect(),
            replaced: force,
        };
        info!(
            branch = %outcome.branch,
            mode = %mode,
            written = outcome.written.len(),
            replaced = force,
            "Pull finished"
        );
        Ok(outcome)
    }

    fn force_hint(&self, err: MigrationError) -> MigrationError {
        match err {
            MigrationError::DivergentHistory(_) => MigrationError::divergent(format!(
                "local migrations are not part of branch {}. Run `xata pull --force` to replace them",
                self.remote.branch()
            )),
            other => other,
        }
    }
}
