//! Format gate between the branch's migration mode and local files.

use tracing::debug;
use xata_client::BranchDetails;

use crate::error::{MigrateResult, MigrationError};
use crate::migration::{Migration, MigrationMode};

/// Decide the branch's migration mode from its details.
pub fn detect_mode(details: &BranchDetails) -> MigrationMode {
    if details.use_pg_roll {
        MigrationMode::PgRoll
    } else {
        MigrationMode::Legacy
    }
}

/// Reject local migrations whose format does not match the branch.
///
/// Formats are never coerced. Converting local files is done by a forced pull.
pub fn validate_local_format(local: &[Migration], mode: MigrationMode) -> MigrateResult<()> {
    let offending = local.iter().find(|m| m.mode() != mode);

    match (offending, mode) {
        (None, _) => Ok(()),
        (Some(migration), MigrationMode::PgRoll) => {
            debug!(id = migration.id(), "Legacy migration on pgroll branch");
            Err(MigrationError::pgroll_required())
        }
        (Some(migration), MigrationMode::Legacy) => Err(MigrationError::FormatMismatch(format!(
            "Migration {} is in pgroll format but the branch does not use pgroll",
            migration.id()
        ))),
    }
}
