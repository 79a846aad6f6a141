//! The API client and its branch-scoped handle.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info};

use crate::database_url::DatabaseUrl;
use crate::error::{ClientError, ClientResult};
use crate::fetcher::Fetcher;
use crate::schema::{Database, TableRepository};
use crate::sql::SqlQuery;
use crate::types::{
    BranchDetails, HistoryRequest, MigrationHistoryPage, MigrationRecord, PageRequest,
    PgRollApplyResponse, PgRollMigration, PgRollMigrationsResponse, PushMigrationsRequest,
    PushMigrationsResponse, SqlResponse,
};

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "XATA_API_KEY";

/// Environment variable holding the database URL.
pub const DATABASE_URL_ENV: &str = "XATA_DATABASE_URL";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API key sent as a bearer token.
    pub api_key: String,
    /// Database the client talks to.
    pub database_url: DatabaseUrl,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Create a configuration.
    pub fn new(api_key: impl Into<String>, database_url: DatabaseUrl) -> Self {
        Self {
            api_key: api_key.into(),
            database_url,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Read the API key and database URL from the environment.
    pub fn from_env() -> ClientResult<Self> {
        let api_key = std::env::var(API_KEY_ENV).map_err(|_| ClientError::MissingApiKey)?;
        let raw_url = std::env::var(DATABASE_URL_ENV)
            .map_err(|_| ClientError::invalid_url("", format!("{} is not set", DATABASE_URL_ENV)))?;
        Ok(Self::new(api_key, DatabaseUrl::parse(&raw_url)?))
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Client for one database.
#[derive(Debug, Clone)]
pub struct XataClient {
    fetcher: Arc<Fetcher>,
    database_url: DatabaseUrl,
}

impl XataClient {
    /// Create a client.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let fetcher = Fetcher::new(config.api_key, config.timeout)?;
        info!(
            workspace = config.database_url.workspace(),
            region = config.database_url.region(),
            database = config.database_url.database(),
            "Client initialized"
        );
        Ok(Self {
            fetcher: Arc::new(fetcher),
            database_url: config.database_url,
        })
    }

    /// The database this client targets.
    pub fn database_url(&self) -> &DatabaseUrl {
        &self.database_url
    }

    /// Handle scoped to one branch.
    pub fn branch(&self, name: impl Into<String>) -> BranchClient {
        let name = name.into();
        BranchClient {
            fetcher: Arc::clone(&self.fetcher),
            endpoint: self.database_url.branch_endpoint(&name),
            name,
        }
    }
}

/// Branch-scoped API handle.
#[derive(Debug, Clone)]
pub struct BranchClient {
    fetcher: Arc<Fetcher>,
    endpoint: String,
    name: String,
}

impl BranchClient {
    /// Branch name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Base URL of all branch endpoints.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    pub(crate) fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Fetch branch metadata and schema.
    pub async fn details(&self) -> ClientResult<BranchDetails> {
        self.fetcher.get(&self.endpoint).await
    }

    /// Fetch one page of the legacy migration history.
    pub async fn migration_history(
        &self,
        cursor: Option<&str>,
        size: u32,
    ) -> ClientResult<MigrationHistoryPage> {
        let body = HistoryRequest {
            page: PageRequest {
                after: cursor,
                size,
            },
        };
        let page: MigrationHistoryPage = self.fetcher.post(&self.url("/schema/history"), &body).await?;
        debug!(
            branch = %self.name,
            entries = page.logs.len(),
            more = page.meta.more,
            "Fetched migration history page"
        );
        Ok(page)
    }

    /// Push legacy migrations in chain order.
    pub async fn push_migrations(
        &self,
        migrations: &[MigrationRecord],
    ) -> ClientResult<PushMigrationsResponse> {
        let body = PushMigrationsRequest { migrations };
        self.fetcher.post(&self.url("/schema/push"), &body).await
    }

    /// Start a pgroll migration job.
    pub async fn pgroll_apply(&self, payload: &Value) -> ClientResult<PgRollApplyResponse> {
        self.fetcher.post(&self.url("/pgroll/apply"), payload).await
    }

    /// List pgroll migrations on the branch.
    pub async fn pgroll_migrations(&self) -> ClientResult<Vec<PgRollMigration>> {
        let response: PgRollMigrationsResponse =
            self.fetcher.get(&self.url("/pgroll/migrations")).await?;
        Ok(response.migrations)
    }

    /// Run a SQL query.
    pub async fn sql(&self, query: &SqlQuery) -> ClientResult<SqlResponse> {
        let response: SqlResponse = self.fetcher.post(&self.url("/sql"), query).await?;
        if let Some(warning) = &response.warning {
            tracing::warn!(branch = %self.name, warning = %warning, "SQL warning");
        }
        Ok(response)
    }

    /// Record accessor for a single table, without schema validation.
    pub fn table(&self, name: impl Into<String>) -> TableRepository {
        TableRepository::new(self.clone(), name)
    }

    /// Accessor registry for a known set of tables.
    pub fn database<I, S>(&self, tables: I) -> Database
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Database::new(self, tables)
    }

    /// Accessor registry built from the branch's current schema.
    pub async fn database_from_schema(&self) -> ClientResult<Database> {
        let details = self.details().await?;
        Ok(Database::from_schema(self, &details.schema))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> XataClient {
        let url = DatabaseUrl::parse("https://test-1234.us-east-1.xata.sh/db/db1").unwrap();
        XataClient::new(ClientConfig::new("1234abcdef", url)).unwrap()
    }

    #[test]
    fn test_branch_endpoint() {
        let branch = client().branch("main");
        assert_eq!(branch.name(), "main");
        assert_eq!(branch.endpoint(), "https://test-1234.us-east-1.xata.sh/db/db1:main");
        assert_eq!(
            branch.url("/schema/history"),
            "https://test-1234.us-east-1.xata.sh/db/db1:main/schema/history"
        );
    }

    #[test]
    fn test_config_timeout() {
        let url = DatabaseUrl::parse("https://ws.eu-west-1.xata.sh/db/app").unwrap();
        let config = ClientConfig::new("key", url).timeout(Duration::from_secs(5));
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_empty_api_key_rejected() {
        let url = DatabaseUrl::parse("https://ws.eu-west-1.xata.sh/db/app").unwrap();
        let err = XataClient::new(ClientConfig::new("", url)).unwrap_err();
        assert!(matches!(err, ClientError::MissingApiKey));
    }
}
