//! [`MigrationRemote`] backed by the HTTP client.

use serde_json::Value;
use xata_client::{
    BranchClient, BranchDetails, ClientError, MigrationHistoryPage, PgRollApplyResponse,
    PushMigrationsResponse,
};

use crate::error::{MigrateResult, MigrationError};
use crate::history::MigrationRemote;
use crate::migration::{MigrationRecord, PgRollMigration};

/// Map an error from a read endpoint.
fn read_error(err: ClientError) -> MigrationError {
    match err {
        ClientError::Decode(e) => MigrationError::invalid_history(e.to_string()),
        other => MigrationError::remote(other.to_string()),
    }
}

/// Map an error from a submission endpoint.
///
/// Requests the service understood but refused are submission failures;
/// everything else means the service was not usable.
fn submit_error(err: ClientError) -> MigrationError {
    match err.status() {
        Some(status) if (400..500).contains(&status) && !err.is_unauthorized() && !err.is_not_found() => {
            MigrationError::submission(err.to_string())
        }
        _ => MigrationError::remote(err.to_string()),
    }
}

#[async_trait::async_trait]
impl MigrationRemote for BranchClient {
    fn branch(&self) -> &str {
        self.name()
    }

    async fn branch_details(&self) -> MigrateResult<BranchDetails> {
        self.details().await.map_err(read_error)
    }

    async fn history_page(
        &self,
        cursor: Option<&str>,
        size: u32,
    ) -> MigrateResult<MigrationHistoryPage> {
        self.migration_history(cursor, size).await.map_err(read_error)
    }

    async fn push_migrations(
        &self,
        migrations: &[MigrationRecord],
    ) -> MigrateResult<PushMigrationsResponse> {
        BranchClient::push_migrations(self, migrations)
            .await
            .map_err(submit_error)
    }

    async fn pgroll_apply(&self, payload: &Value) -> MigrateResult<PgRollApplyResponse> {
        BranchClient::pgroll_apply(self, payload)
            .await
            .map_err(submit_error)
    }

    async fn pgroll_migrations(&self) -> MigrateResult<Vec<PgRollMigration>> {
        BranchClient::pgroll_migrations(self).await.map_err(read_error)
    }
}
