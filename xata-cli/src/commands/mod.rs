//! CLI command implementations.

pub mod pull;
pub mod push;
pub mod schema;
pub mod version;

use xata_client::{BranchClient, ClientConfig, XataClient};
use xata_migrate::{LocalMigrationStore, Reconciler};

use crate::cli::GlobalArgs;
use crate::config::{Config, Settings};
use crate::error::CliResult;
use crate::output;

/// Everything a remote command needs
pub struct Context {
    /// Resolved settings
    pub settings: Settings,
    /// Handle on the target branch
    pub branch: BranchClient,
}

impl Context {
    /// Resolve settings and build the API client
    pub fn load(global: &GlobalArgs) -> CliResult<Self> {
        let cwd = std::env::current_dir()?;
        let config = Config::discover(global.config.as_deref(), &cwd)?;
        let settings = Settings::resolve(global, &config, &cwd)?;

        let client = XataClient::new(ClientConfig::new(
            settings.api_key.clone(),
            settings.database_url.clone(),
        ))?;
        let branch = client.branch(settings.branch.clone());

        tracing::debug!(
            database = settings.database_url.database(),
            branch = %settings.branch,
            migrations = %settings.migrations_dir.display(),
            "Resolved CLI context"
        );
        Ok(Self { settings, branch })
    }

    /// Reconciler between the local directory and the branch
    pub fn reconciler(&self) -> Reconciler<BranchClient> {
        Reconciler::new(
            self.branch.clone(),
            LocalMigrationStore::new(&self.settings.migrations_dir),
        )
    }

    /// Print where the command is pointed
    pub fn print_target(&self) {
        output::kv("Database", &self.settings.database_url);
        output::kv("Branch", &self.settings.branch);
        output::kv("Migrations", self.settings.migrations_dir.display());
        output::newline();
    }
}
