//! Per-table record accessors.
//!
//! Accessors are registered once from a known list of table names (usually
//! taken from the branch schema) and looked up by name. Asking for a table
//! that is not registered is an error rather than a silently-built accessor.

use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use crate::client::BranchClient;
use crate::error::{ClientError, ClientResult};

/// Record operations on one table.
#[derive(Debug, Clone)]
pub struct TableRepository {
    branch: BranchClient,
    table: String,
}

impl TableRepository {
    pub(crate) fn new(branch: BranchClient, table: impl Into<String>) -> Self {
        Self {
            branch,
            table: table.into(),
        }
    }

    /// Table name.
    pub fn name(&self) -> &str {
        &self.table
    }

    fn data_url(&self) -> String {
        self.branch.url(&format!("/tables/{}/data", self.table))
    }

    fn record_url(&self, id: &str) -> String {
        format!("{}/{}", self.data_url(), id)
    }

    /// Read a record by ID. Returns `None` when it does not exist.
    pub async fn read(&self, id: &str) -> ClientResult<Option<Value>> {
        match self.branch.fetcher().get(&self.record_url(id)).await {
            Ok(record) => Ok(Some(record)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Insert a record and return it as stored.
    pub async fn create(&self, record: &Value) -> ClientResult<Value> {
        self.branch.fetcher().post(&self.data_url(), record).await
    }

    /// Delete a record by ID.
    pub async fn delete(&self, id: &str) -> ClientResult<()> {
        let _: Value = self.branch.fetcher().delete(&self.record_url(id)).await?;
        Ok(())
    }
}

/// Registry of table accessors for one branch.
#[derive(Debug, Clone)]
pub struct Database {
    tables: IndexMap<String, TableRepository>,
}

impl Database {
    /// Register an accessor for each table name.
    pub fn new<I, S>(branch: &BranchClient, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tables: IndexMap<String, TableRepository> = tables
            .into_iter()
            .map(Into::into)
            .map(|name: String| (name.clone(), TableRepository::new(branch.clone(), name)))
            .collect();

        debug!(branch = branch.name(), tables = tables.len(), "Registered table accessors");
        Self { tables }
    }

    /// Register accessors for every table found in a branch schema.
    pub fn from_schema(branch: &BranchClient, schema: &Value) -> Self {
        Self::new(branch, table_names(schema))
    }

    /// Look up a table accessor.
    pub fn table(&self, name: &str) -> ClientResult<&TableRepository> {
        self.tables
            .get(name)
            .ok_or_else(|| ClientError::UnknownTable(name.to_string()))
    }

    /// Registered table names, in registration order.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Check if a table is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Number of registered tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Check if no tables are registered.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Extract table names from a schema.
///
/// Both schema shapes served by the API are understood: `tables` as an array
/// of `{ "name": ... }` objects, or as an object keyed by table name.
pub fn table_names(schema: &Value) -> Vec<String> {
    match schema.get("tables") {
        Some(Value::Array(tables)) => tables
            .iter()
            .filter_map(|t| t.get("name").and_then(Value::as_str))
            .map(str::to_string)
            .collect(),
        Some(Value::Object(tables)) => tables.keys().cloned().collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ClientConfig, XataClient};
    use crate::database_url::DatabaseUrl;
    use serde_json::json;

    fn branch() -> BranchClient {
        let url = DatabaseUrl::parse("https://test-1234.us-east-1.xata.sh/db/db1").unwrap();
        XataClient::new(ClientConfig::new("key", url))
            .unwrap()
            .branch("main")
    }

    #[test]
    fn test_table_names_from_array_schema() {
        let schema = json!({"tables": [{"name": "users", "columns": []}, {"name": "posts"}]});
        assert_eq!(table_names(&schema), vec!["users", "posts"]);
    }

    #[test]
    fn test_table_names_from_keyed_schema() {
        let schema = json!({"name": "bb_x", "tables": {"table1": {"oid": "747164", "name": "table1"}}});
        assert_eq!(table_names(&schema), vec!["table1"]);
    }

    #[test]
    fn test_table_names_missing() {
        assert!(table_names(&json!({})).is_empty());
    }

    #[test]
    fn test_registry_lookup() {
        let db = Database::new(&branch(), ["users", "posts"]);
        assert_eq!(db.len(), 2);
        assert!(db.contains("users"));
        assert_eq!(db.table("posts").unwrap().name(), "posts");
        assert_eq!(db.table_names().collect::<Vec<_>>(), vec!["users", "posts"]);
    }

    #[test]
    fn test_registry_rejects_unknown_table() {
        let db = Database::from_schema(&branch(), &json!({"tables": [{"name": "users"}]}));
        let err = db.table("accounts").unwrap_err();
        assert!(matches!(err, ClientError::UnknownTable(name) if name == "accounts"));
    }

    #[tokio::test]
    async fn test_transport_failure_is_not_a_missing_record() {
        let url = DatabaseUrl::parse("http://127.0.0.1:1/db/db1").unwrap();
        let table = XataClient::new(ClientConfig::new("key", url))
            .unwrap()
            .branch("main")
            .table("users");

        let err = table.read("rec_1").await.unwrap_err();
        assert!(matches!(err, ClientError::Http(_)));
    }

    #[test]
    fn test_record_urls() {
        let table = branch().table("users");
        assert_eq!(
            table.record_url("rec_1"),
            "https://test-1234.us-east-1.xata.sh/db/db1:main/tables/users/data/rec_1"
        );
    }
}
