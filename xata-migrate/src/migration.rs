//! Migration model shared by the local store, the differ and the executor.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

pub use xata_client::{MigrationRecord, PgRollMigration, PgRollMigrationType};

/// Checksum scheme version written by [`compute_checksum`].
pub const CHECKSUM_VERSION: u32 = 1;

/// How a branch stores its migrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MigrationMode {
    /// Legacy migrations API.
    Legacy,
    /// pgroll jobs.
    PgRoll,
}

impl fmt::Display for MigrationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy => write!(f, "legacy"),
            Self::PgRoll => write!(f, "pgroll"),
        }
    }
}

/// A migration in either format.
///
/// The variant is decided by the presence of the `migrationType` marker when
/// deserializing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Migration {
    /// Legacy record.
    Legacy(MigrationRecord),
    /// pgroll migration.
    PgRoll(PgRollMigration),
}

impl Migration {
    /// Migration identifier (legacy `id` or pgroll `name`).
    pub fn id(&self) -> &str {
        match self {
            Self::Legacy(record) => &record.id,
            Self::PgRoll(migration) => &migration.name,
        }
    }

    /// Identifier of the preceding migration.
    pub fn parent(&self) -> Option<&str> {
        match self {
            Self::Legacy(record) => record.parent_id.as_deref(),
            Self::PgRoll(migration) => migration.parent.as_deref(),
        }
    }

    /// Check if this migration is in pgroll format.
    pub fn is_pgroll(&self) -> bool {
        matches!(self, Self::PgRoll(_))
    }

    /// Format this migration is in.
    pub fn mode(&self) -> MigrationMode {
        match self {
            Self::Legacy(_) => MigrationMode::Legacy,
            Self::PgRoll(_) => MigrationMode::PgRoll,
        }
    }

    /// Checksum, for legacy records.
    pub fn checksum(&self) -> Option<&str> {
        match self {
            Self::Legacy(record) => Some(&record.checksum),
            Self::PgRoll(_) => None,
        }
    }

    /// Check the record's own fields for consistency.
    pub fn validate(&self) -> Result<(), String> {
        if self.id().trim().is_empty() {
            return Err("migration identifier is empty".to_string());
        }
        match self {
            Self::Legacy(record) => parse_checksum(&record.checksum).map(|_| ()),
            Self::PgRoll(migration) => migration
                .payload()
                .map(|_| ())
                .map_err(|e| format!("invalid pgroll payload: {}", e)),
        }
    }
}

impl From<MigrationRecord> for Migration {
    fn from(record: MigrationRecord) -> Self {
        Self::Legacy(record)
    }
}

impl From<PgRollMigration> for Migration {
    fn from(migration: PgRollMigration) -> Self {
        Self::PgRoll(migration)
    }
}

impl<'de> Deserialize<'de> for Migration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let result = if value.get("migrationType").is_some() {
            serde_json::from_value(value).map(Self::PgRoll)
        } else {
            serde_json::from_value(value).map(Self::Legacy)
        };
        result.map_err(serde::de::Error::custom)
    }
}

/// Build a legacy record with a freshly computed checksum.
pub fn new_record(
    id: impl Into<String>,
    parent_id: Option<&str>,
    operations: Vec<Value>,
) -> MigrationRecord {
    let checksum = compute_checksum(parent_id, &operations);
    MigrationRecord {
        id: id.into(),
        parent_id: parent_id.map(str::to_string),
        checksum,
        operations,
    }
}

/// Compute the checksum of a legacy record's content.
///
/// The digest covers the operations and the parent link, serialized as JSON
/// with sorted keys.
pub fn compute_checksum(parent_id: Option<&str>, operations: &[Value]) -> String {
    let canonical = serde_json::json!({
        "operations": operations,
        "parentID": parent_id,
    });

    let mut hasher = Sha256::new();
    hasher.update(canonical.to_string().as_bytes());
    format!("{}:{}", CHECKSUM_VERSION, hex::encode(hasher.finalize()))
}

/// Split a checksum into its version and digest.
pub fn parse_checksum(checksum: &str) -> Result<(u32, &str), String> {
    let (version, digest) = checksum
        .split_once(':')
        .ok_or_else(|| format!("malformed checksum '{}': missing version", checksum))?;

    if version.is_empty() || !version.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("malformed checksum '{}': bad version", checksum));
    }
    if digest.is_empty() {
        return Err(format!("malformed checksum '{}': empty digest", checksum));
    }

    let version = version
        .parse()
        .map_err(|_| format!("malformed checksum '{}': bad version", checksum))?;
    Ok((version, digest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn add_column() -> Vec<Value> {
        vec![json!({"addColumn": {"column": {"name": "test", "type": "string"}, "table": "test"}})]
    }

    #[test]
    fn test_checksum_is_deterministic() {
        let a = compute_checksum(Some("mig_a"), &add_column());
        let b = compute_checksum(Some("mig_a"), &add_column());
        assert_eq!(a, b);
        assert!(a.starts_with("1:"));
        assert_eq!(a.len(), 2 + 64);
    }

    #[test]
    fn test_checksum_covers_parent() {
        assert_ne!(
            compute_checksum(Some("mig_a"), &add_column()),
            compute_checksum(Some("mig_b"), &add_column())
        );
        assert_ne!(
            compute_checksum(None, &add_column()),
            compute_checksum(None, &[])
        );
    }

    #[test]
    fn test_parse_checksum() {
        let (version, digest) =
            parse_checksum("1:92d84ef84afc56e2152fd48d098d1b7ef4328217eadd5db6b3f646ac94a1a5ad")
                .unwrap();
        assert_eq!(version, 1);
        assert_eq!(digest.len(), 64);

        assert!(parse_checksum("92d84ef8").is_err());
        assert!(parse_checksum("v1:abc").is_err());
        assert!(parse_checksum("1:").is_err());
        assert!(parse_checksum(":abc").is_err());
    }

    #[test]
    fn test_deserialize_picks_variant_by_marker() {
        let legacy: Migration = serde_json::from_value(json!({
            "id": "mig_a",
            "checksum": "1:abc",
            "operations": []
        }))
        .unwrap();
        assert!(!legacy.is_pgroll());
        assert_eq!(legacy.id(), "mig_a");
        assert_eq!(legacy.parent(), None);

        let pgroll: Migration = serde_json::from_value(json!({
            "name": "mig_b",
            "parent": "mig_a",
            "migration": "{\"name\": \"mig_b\", \"operations\": []}",
            "migrationType": "inferred",
            "done": true
        }))
        .unwrap();
        assert!(pgroll.is_pgroll());
        assert_eq!(pgroll.mode(), MigrationMode::PgRoll);
        assert_eq!(pgroll.parent(), Some("mig_a"));
        assert_eq!(pgroll.checksum(), None);
    }

    #[test]
    fn test_serialize_is_untagged() {
        let migration = Migration::from(new_record("mig_a", None, add_column()));
        let value = serde_json::to_value(&migration).unwrap();
        assert_eq!(value["id"], "mig_a");
        assert!(value.get("Legacy").is_none());
    }

    #[test]
    fn test_validate() {
        assert!(Migration::from(new_record("mig_a", None, vec![])).validate().is_ok());

        let mut record = new_record("mig_a", None, vec![]);
        record.checksum = "nope".into();
        assert!(Migration::from(record).validate().is_err());

        let pgroll = PgRollMigration {
            name: "mig_b".into(),
            parent: None,
            migration: "not json".into(),
            done: false,
            migration_type: PgRollMigrationType::Pgroll,
            started_at: None,
        };
        assert!(Migration::from(pgroll).validate().is_err());
    }
}
