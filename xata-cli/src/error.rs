//! CLI error types and result alias.

use miette::Diagnostic;
use thiserror::Error;
use xata_client::ClientError;
use xata_migrate::MigrationError;

/// Result type alias for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// CLI error types
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// IO error
    #[error("IO error: {0}")]
    #[diagnostic(code(xata::io))]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    #[diagnostic(
        code(xata::config),
        help("Set it in xata.toml, pass it as a flag, or export the XATA_* environment variable")
    )]
    Config(String),

    /// API client error
    #[error("{0}")]
    #[diagnostic(code(xata::client))]
    Client(#[from] ClientError),

    /// Migration reconciliation error
    #[error("{source}")]
    #[diagnostic(code(xata::migration))]
    Migration {
        /// Underlying error.
        source: MigrationError,
        /// Suggested next step.
        #[help]
        help: Option<String>,
    },

    /// JSON serialization error
    #[error("JSON error: {0}")]
    #[diagnostic(code(xata::json))]
    Json(#[from] serde_json::Error),
}

impl From<MigrationError> for CliError {
    fn from(source: MigrationError) -> Self {
        let help = match &source {
            MigrationError::RemoteUnavailable(_) => {
                Some("Check your network connection and API key, then try again".to_string())
            }
            MigrationError::CorruptMigration { .. } => {
                Some("Fix or remove the file, or run `xata pull --force` to restore it".to_string())
            }
            MigrationError::DivergentHistory(_) => {
                Some("Run `xata pull --force` to replace local migrations with the branch history".to_string())
            }
            _ => None,
        };
        Self::Migration { source, help }
    }
}

impl From<toml::de::Error> for CliError {
    fn from(err: toml::de::Error) -> Self {
        CliError::Config(format!("Failed to parse TOML: {}", err))
    }
}

impl CliError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
