//! Wire types mirroring the service API.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Branch metadata returned by the branch details endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchDetails {
    /// Name of the database the branch belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_name: Option<String>,
    /// Name of the branch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_name: Option<String>,
    /// Whether migrations on this branch run through pgroll.
    #[serde(default)]
    pub use_pg_roll: bool,
    /// The branch schema, kept as raw JSON.
    #[serde(default)]
    pub schema: Value,
}

/// A migration in the legacy migrations API format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationRecord {
    /// Migration ID (`mig_...`).
    pub id: String,
    /// ID of the preceding migration; absent at the root of a chain.
    #[serde(rename = "parentID", default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Checksum in `<version>:<hex-digest>` form.
    pub checksum: String,
    /// Schema-change operations, applied atomically.
    #[serde(default)]
    pub operations: Vec<Value>,
}

/// Marker distinguishing pgroll migrations from legacy ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PgRollMigrationType {
    /// Authored migration.
    Pgroll,
    /// Migration inferred by the service from direct DDL.
    Inferred,
}

impl fmt::Display for PgRollMigrationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pgroll => write!(f, "pgroll"),
            Self::Inferred => write!(f, "inferred"),
        }
    }
}

/// A migration in pgroll job format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PgRollMigration {
    /// Migration name, analogous to a legacy ID.
    pub name: String,
    /// Name of the preceding migration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Serialized pgroll payload (`{"name": ..., "operations": [...]}`).
    pub migration: String,
    /// Whether the remote job has finished applying.
    #[serde(default)]
    pub done: bool,
    /// Format marker.
    pub migration_type: PgRollMigrationType,
    /// When the remote job started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
}

impl PgRollMigration {
    /// Decode the serialized pgroll payload.
    pub fn payload(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.migration)
    }
}

/// Pagination metadata of a history page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    /// Opaque cursor to pass back for the next page.
    #[serde(default, deserialize_with = "deserialize_cursor")]
    pub cursor: Option<String>,
    /// Whether more pages follow.
    #[serde(default)]
    pub more: bool,
}

/// One page of the legacy migration history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MigrationHistoryPage {
    /// Pagination metadata.
    #[serde(default)]
    pub meta: PageMeta,
    /// Migrations on this page.
    #[serde(default)]
    pub logs: Vec<MigrationRecord>,
}

/// Page request for the history endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct PageRequest<'a> {
    /// Cursor returned by the previous page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<&'a str>,
    /// Maximum number of entries.
    pub size: u32,
}

/// Body of the history request.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryRequest<'a> {
    /// Requested page.
    pub page: PageRequest<'a>,
}

/// Body of the legacy schema push request.
#[derive(Debug, Clone, Serialize)]
pub struct PushMigrationsRequest<'a> {
    /// Migrations to push, in chain order.
    pub migrations: &'a [MigrationRecord],
}

/// Response of the legacy schema push endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMigrationsResponse {
    /// ID of the migration now at the tip.
    #[serde(rename = "migrationID")]
    pub migration_id: String,
    /// ID of its parent.
    #[serde(rename = "parentMigrationID", default)]
    pub parent_migration_id: Option<String>,
    /// Outcome reported by the service.
    pub status: String,
}

impl PushMigrationsResponse {
    /// Status string the service reports for a successful push.
    pub const COMPLETED: &'static str = "completed";

    /// Check whether the push completed.
    pub fn is_completed(&self) -> bool {
        self.status == Self::COMPLETED
    }
}

/// Response of the pgroll apply endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PgRollApplyResponse {
    /// Asynchronous job reference.
    #[serde(rename = "jobID")]
    pub job_id: String,
}

/// Response of the pgroll migrations list endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PgRollMigrationsResponse {
    /// Migrations known to pgroll on this branch.
    #[serde(default)]
    pub migrations: Vec<PgRollMigration>,
}

/// Column metadata returned by a SQL query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlColumn {
    /// Column name.
    pub name: String,
    /// Postgres type name.
    #[serde(rename = "type")]
    pub column_type: String,
}

/// Result of a SQL query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SqlResponse {
    /// Rows, as objects or arrays depending on the response type.
    #[serde(default)]
    pub records: Vec<Value>,
    /// Column metadata.
    #[serde(default)]
    pub columns: Vec<SqlColumn>,
    /// Warning emitted by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

fn deserialize_cursor<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Null) | None => None,
        Some(other) => {
            return Err(serde::de::Error::custom(format!(
                "cursor must be a string or number, got {other}"
            )));
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_migration_record_wire_names() {
        let record: MigrationRecord = serde_json::from_value(json!({
            "id": "mig_ce3lg2hp3o0em98s8r50",
            "parentID": "mig_ce3lfvhp3o0em98s8r40",
            "checksum": "1:92d84ef84afc56e2152fd48d098d1b7ef4328217eadd5db6b3f646ac94a1a5ad",
            "operations": [{"addColumn": {"column": {"name": "test", "type": "string"}, "table": "test"}}]
        }))
        .unwrap();

        assert_eq!(record.parent_id.as_deref(), Some("mig_ce3lfvhp3o0em98s8r40"));
        assert_eq!(record.operations.len(), 1);

        let back = serde_json::to_value(&record).unwrap();
        assert!(back.get("parentID").is_some());
    }

    #[test]
    fn test_root_record_omits_parent() {
        let record = MigrationRecord {
            id: "mig_root".into(),
            parent_id: None,
            checksum: "1:00".into(),
            operations: Vec::new(),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("parentID").is_none());
    }

    #[test]
    fn test_pgroll_migration_payload() {
        let migration: PgRollMigration = serde_json::from_value(json!({
            "done": false,
            "migration": "{\"name\": \"mig_cmkjcdrj7c92neg7lnmg\", \"operations\": [{\"drop_column\": {\"down\": \"\", \"table\": \"tester\", \"column\": \"Firstname\"}}]}",
            "migrationType": "pgroll",
            "name": "mig_cmkjcdrj7c92neg7lnmg",
            "parent": "mig_cmkjccmg1th0of00f5n0",
            "startedAt": "2024-01-18T14:31:20.795975Z"
        }))
        .unwrap();

        assert_eq!(migration.migration_type, PgRollMigrationType::Pgroll);
        assert!(migration.started_at.is_some());

        let payload = migration.payload().unwrap();
        assert_eq!(payload["name"], "mig_cmkjcdrj7c92neg7lnmg");
        assert_eq!(payload["operations"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn test_page_meta_accepts_numeric_cursor() {
        let page: MigrationHistoryPage =
            serde_json::from_value(json!({"meta": {"cursor": 1, "more": false}, "logs": []})).unwrap();
        assert_eq!(page.meta.cursor.as_deref(), Some("1"));
        assert!(!page.meta.more);

        let page: MigrationHistoryPage =
            serde_json::from_value(json!({"meta": {"cursor": "abc", "more": true}})).unwrap();
        assert_eq!(page.meta.cursor.as_deref(), Some("abc"));
        assert!(page.meta.more);
        assert!(page.logs.is_empty());
    }

    #[test]
    fn test_branch_details_defaults_to_legacy() {
        let details: BranchDetails =
            serde_json::from_value(json!({"schema": {"tables": []}})).unwrap();
        assert!(!details.use_pg_roll);

        let details: BranchDetails =
            serde_json::from_value(json!({"usePgRoll": true, "schema": {}})).unwrap();
        assert!(details.use_pg_roll);
    }

    #[test]
    fn test_push_response_status() {
        let response: PushMigrationsResponse = serde_json::from_value(json!({
            "migrationID": "mig_b",
            "parentMigrationID": "mig_a",
            "status": "completed"
        }))
        .unwrap();
        assert!(response.is_completed());
    }

    #[test]
    fn test_history_request_shape() {
        let body = HistoryRequest {
            page: PageRequest {
                after: None,
                size: 50,
            },
        };
        assert_eq!(serde_json::to_value(&body).unwrap(), json!({"page": {"size": 50}}));
    }
}
