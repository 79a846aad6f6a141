//! CLI configuration handling.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use xata_client::DatabaseUrl;
use xata_migrate::DEFAULT_MIGRATIONS_DIR;

use crate::cli::GlobalArgs;
use crate::error::{CliError, CliResult};

/// Default config file name (lives in project root)
pub const CONFIG_FILE_NAME: &str = "xata.toml";

/// Branch used when none is configured anywhere
pub const DEFAULT_BRANCH: &str = "main";

/// Xata CLI configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database configuration
    pub database: DatabaseConfig,

    /// Migration configuration
    pub migrations: MigrationConfig,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the config file if present, defaults otherwise
    ///
    /// An explicitly requested file must exist.
    pub fn discover(explicit: Option<&Path>, cwd: &Path) -> CliResult<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let path = cwd.join(CONFIG_FILE_NAME);
                if path.exists() {
                    Self::load(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: Option<String>,

    /// Default branch
    pub branch: Option<String>,
}

/// Migration configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// Directory for migration files
    pub directory: String,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            directory: DEFAULT_MIGRATIONS_DIR.to_string(),
        }
    }
}

/// Settings resolved from flags, environment and the config file
#[derive(Debug, Clone)]
pub struct Settings {
    /// API key
    pub api_key: String,
    /// Target database
    pub database_url: DatabaseUrl,
    /// Target branch
    pub branch: String,
    /// Local migrations directory
    pub migrations_dir: PathBuf,
}

impl Settings {
    /// Resolve settings. Flags and environment win over the config file.
    ///
    /// The branch falls back to the one embedded in the database URL, then to `main`.
    pub fn resolve(global: &GlobalArgs, config: &Config, cwd: &Path) -> CliResult<Self> {
        let raw_url = global
            .db
            .as_deref()
            .or(config.database.url.as_deref())
            .ok_or_else(|| CliError::config("no database URL configured"))?;
        let database_url = DatabaseUrl::parse(raw_url)?;

        let api_key = global
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| CliError::config("no API key configured"))?;

        let branch = global
            .branch
            .as_deref()
            .or(config.database.branch.as_deref())
            .or(database_url.branch())
            .unwrap_or(DEFAULT_BRANCH)
            .to_string();

        let migrations_dir = global
            .migrations_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(&config.migrations.directory));
        let migrations_dir = if migrations_dir.is_absolute() {
            migrations_dir
        } else {
            cwd.join(migrations_dir)
        };

        Ok(Self {
            api_key,
            database_url,
            branch,
            migrations_dir,
        })
    }
}
