//! Error types for migration reconciliation.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for migration operations.
pub type MigrateResult<T> = Result<T, MigrationError>;

/// Remediation printed when local files do not match a pgroll branch.
pub const PGROLL_REMEDIATION: &str =
    "Please run xata pull -f to convert all migrations to pgroll format";

/// Errors that can occur while reconciling migrations.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// The remote could not be reached or rejected the request.
    #[error("Remote unavailable: {0}")]
    RemoteUnavailable(String),

    /// A local migration file is missing, unreadable or malformed.
    #[error("Corrupt migration {}: {reason}", path.display())]
    CorruptMigration {
        /// File that failed to load.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// Local migrations are in the wrong format for the branch.
    #[error("{0}")]
    FormatMismatch(String),

    /// Local and remote chains disagree.
    #[error("Divergent history: {0}")]
    DivergentHistory(String),

    /// The remote refused the pushed migrations.
    #[error("Migration submission failed: {0}")]
    SubmissionFailed(String),

    /// The remote history does not form a single chain.
    #[error("Invalid remote history: {0}")]
    InvalidHistory(String),

    /// File system error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MigrationError {
    /// Create a remote unavailable error.
    pub fn remote(msg: impl Into<String>) -> Self {
        Self::RemoteUnavailable(msg.into())
    }

    /// Create a corrupt migration error.
    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::CorruptMigration {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Format mismatch for legacy files on a pgroll branch.
    pub fn pgroll_required() -> Self {
        Self::FormatMismatch(PGROLL_REMEDIATION.to_string())
    }

    /// Create a divergent history error.
    pub fn divergent(msg: impl Into<String>) -> Self {
        Self::DivergentHistory(msg.into())
    }

    /// Create a submission failed error.
    pub fn submission(msg: impl Into<String>) -> Self {
        Self::SubmissionFailed(msg.into())
    }

    /// Create an invalid history error.
    pub fn invalid_history(msg: impl Into<String>) -> Self {
        Self::InvalidHistory(msg.into())
    }

    /// Check if re-running the command may succeed without local changes.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RemoteUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pgroll_remediation_message() {
        let err = MigrationError::pgroll_required();
        assert_eq!(
            err.to_string(),
            "Please run xata pull -f to convert all migrations to pgroll format"
        );
    }

    #[test]
    fn test_corrupt_names_file() {
        let err = MigrationError::corrupt(".xata/migrations/mig_a.json", "expected value at line 1");
        let msg = err.to_string();
        assert!(msg.contains("mig_a.json"));
        assert!(msg.contains("expected value"));
    }

    #[test]
    fn test_only_remote_errors_are_retryable() {
        assert!(MigrationError::remote("timeout").is_retryable());
        assert!(!MigrationError::divergent("mig_x").is_retryable());
        assert!(!MigrationError::submission("failed").is_retryable());
        assert!(!MigrationError::pgroll_required().is_retryable());
    }
}
