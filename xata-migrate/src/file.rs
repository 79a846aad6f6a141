//! Local migration files.
//!
//! A migrations directory holds one `<id>.json` file per migration and a
//! `.ledger` file listing identifiers root first, one per line. The ledger
//! is the only source of local order.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{MigrateResult, MigrationError};
use crate::migration::Migration;

/// Default migrations directory, relative to the project root.
pub const DEFAULT_MIGRATIONS_DIR: &str = ".xata/migrations";

/// Name of the ledger file inside the migrations directory.
pub const LEDGER_FILE: &str = ".ledger";

/// Scratch directory used while replacing the whole chain.
const STAGING_DIR: &str = ".staging";

/// Check that a migration identifier is a single plain file name.
pub fn check_id(id: &str) -> Result<(), String> {
    let mut components = Path::new(id).components();
    let plain = matches!(components.next(), Some(Component::Normal(name)) if name == id)
        && components.next().is_none();

    if plain && !id.contains(['/', '\\']) {
        Ok(())
    } else {
        Err(format!("'{}' is not a valid migration identifier", id))
    }
}

/// Reader/writer for a local migrations directory.
#[derive(Debug, Clone)]
pub struct LocalMigrationStore {
    dir: PathBuf,
}

impl LocalMigrationStore {
    /// Create a store for a directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Get the migrations directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the ledger file.
    pub fn ledger_path(&self) -> PathBuf {
        self.dir.join(LEDGER_FILE)
    }

    /// Path of a migration file.
    ///
    /// Identifiers that would resolve outside the directory are rejected.
    pub fn migration_path(&self, id: &str) -> MigrateResult<PathBuf> {
        let path = self.dir.join(format!("{}.json", id));
        check_id(id).map_err(|reason| MigrationError::corrupt(&path, reason))?;
        Ok(path)
    }

    /// List local migration identifiers in ledger order.
    pub async fn list_local(&self) -> MigrateResult<Vec<String>> {
        let path = self.ledger_path();
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(MigrationError::Io(e)),
        };

        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if !seen.insert(line) {
                return Err(MigrationError::corrupt(
                    &path,
                    format!("duplicate entry '{}'", line),
                ));
            }
            check_id(line).map_err(|reason| MigrationError::corrupt(&path, reason))?;
            ids.push(line.to_string());
        }

        Ok(ids)
    }

    /// Read one migration file.
    pub async fn read_migration(&self, id: &str) -> MigrateResult<Migration> {
        let path = self.migration_path(id)?;
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| MigrationError::corrupt(&path, e.to_string()))?;

        let migration: Migration = serde_json::from_str(&content)
            .map_err(|e| MigrationError::corrupt(&path, e.to_string()))?;
        migration
            .validate()
            .map_err(|reason| MigrationError::corrupt(&path, reason))?;

        if migration.id() != id {
            return Err(MigrationError::corrupt(
                &path,
                format!("file holds migration '{}'", migration.id()),
            ));
        }

        debug!(id = id, pgroll = migration.is_pgroll(), "Read migration file");
        Ok(migration)
    }

    /// Read every migration listed in the ledger, root first.
    ///
    /// The first unreadable file aborts the load.
    pub async fn load_chain(&self) -> MigrateResult<Vec<Migration>> {
        let ids = self.list_local().await?;
        let mut chain: Vec<Migration> = Vec::with_capacity(ids.len());

        for id in &ids {
            let migration = self.read_migration(id).await?;
            let expected = chain.last().map(Migration::id);
            if migration.parent() != expected {
                warn!(
                    id = id.as_str(),
                    parent = ?migration.parent(),
                    expected = ?expected,
                    "Local parent link disagrees with ledger order"
                );
            }
            chain.push(migration);
        }

        Ok(chain)
    }

    /// Write one migration file.
    pub async fn write_migration(&self, migration: &Migration) -> MigrateResult<PathBuf> {
        self.ensure_dir().await?;

        let path = self.migration_path(migration.id())?;
        let mut content = serde_json::to_string_pretty(migration)
            .map_err(|e| MigrationError::corrupt(&path, e.to_string()))?;
        content.push('\n');

        write_atomic(&path, &content).await?;
        debug!(id = migration.id(), "Wrote migration file");
        Ok(path)
    }

    /// Replace the ledger.
    pub async fn write_ledger<S: AsRef<str>>(&self, ids: &[S]) -> MigrateResult<()> {
        self.ensure_dir().await?;

        let mut content = String::new();
        for id in ids {
            content.push_str(id.as_ref());
            content.push('\n');
        }

        write_atomic(&self.ledger_path(), &content).await
    }

    /// Replace every local migration and the ledger with `migrations`.
    ///
    /// The new chain is written to a staging directory first. If any write
    /// fails the existing files are left as they were. Files that are not
    /// migrations are kept.
    pub async fn replace_all(&self, migrations: &[Migration]) -> MigrateResult<()> {
        let staging = LocalMigrationStore::new(self.dir.join(STAGING_DIR));
        staging.remove_dir().await?;

        if let Err(e) = staging.stage(migrations).await {
            if let Err(cleanup) = staging.remove_dir().await {
                warn!(error = %cleanup, "Failed to remove staging directory");
            }
            return Err(e);
        }

        let mut keep = HashSet::new();
        for migration in migrations {
            let id = migration.id();
            tokio::fs::rename(staging.migration_path(id)?, self.migration_path(id)?).await?;
            keep.insert(format!("{}.json", id));
        }
        self.remove_stale(&keep).await?;
        tokio::fs::rename(staging.ledger_path(), self.ledger_path()).await?;
        staging.remove_dir().await?;

        debug!(
            dir = %self.dir.display(),
            migrations = migrations.len(),
            "Replaced local migrations"
        );
        Ok(())
    }

    async fn stage(&self, migrations: &[Migration]) -> MigrateResult<()> {
        for migration in migrations {
            self.write_migration(migration).await?;
        }
        let ids: Vec<&str> = migrations.iter().map(Migration::id).collect();
        self.write_ledger(&ids).await
    }

    /// Delete migration files whose name is not in `keep`.
    async fn remove_stale(&self, keep: &HashSet<String>) -> MigrateResult<()> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_json = path.extension().is_some_and(|ext| ext == "json");
            let kept = entry
                .file_name()
                .to_str()
                .is_some_and(|name| keep.contains(name));
            if is_json && !kept && entry.file_type().await?.is_file() {
                tokio::fs::remove_file(&path).await?;
                debug!(path = %path.display(), "Removed stale migration file");
            }
        }
        Ok(())
    }

    async fn remove_dir(&self) -> MigrateResult<()> {
        match tokio::fs::remove_dir_all(&self.dir).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(MigrationError::Io(e)),
            _ => Ok(()),
        }
    }

    async fn ensure_dir(&self) -> MigrateResult<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(MigrationError::Io)
    }
}

/// Write through a sibling temp file so readers never see a partial file.
async fn write_atomic(path: &Path, content: &str) -> MigrateResult<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, content).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::{PgRollMigration, PgRollMigrationType, new_record};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    fn store() -> (TempDir, LocalMigrationStore) {
        let dir = TempDir::new().unwrap();
        let store = LocalMigrationStore::new(dir.path().join("migrations"));
        (dir, store)
    }

    #[tokio::test]
    async fn test_missing_dir_is_empty() {
        let (_dir, store) = store();
        assert!(store.list_local().await.unwrap().is_empty());
        assert!(store.load_chain().await.unwrap().is_empty());
        store.replace_all(&[]).await.unwrap();
        assert!(store.list_local().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_record_round_trip() {
        let (_dir, store) = store();
        let record = new_record(
            "mig_cd8ifsnd0j0u1oqfrkg0",
            Some("mig_cd8ifrnd0j0u1oqfrkf0"),
            vec![json!({"addTable": {"table": "users"}})],
        );

        store.write_migration(&Migration::from(record.clone())).await.unwrap();
        let read = store.read_migration(&record.id).await.unwrap();

        assert_eq!(read, Migration::Legacy(record));
    }

    #[tokio::test]
    async fn test_ledger_order_wins() {
        let (_dir, store) = store();
        let first = new_record("mig_z", None, vec![]);
        let second = new_record("mig_a", Some("mig_z"), vec![]);
        store.write_migration(&first.clone().into()).await.unwrap();
        store.write_migration(&second.clone().into()).await.unwrap();
        store.write_ledger(&["mig_z", "mig_a"]).await.unwrap();

        assert_eq!(store.list_local().await.unwrap(), vec!["mig_z", "mig_a"]);
        let chain = store.load_chain().await.unwrap();
        assert_eq!(
            chain.iter().map(Migration::id).collect::<Vec<_>>(),
            vec!["mig_z", "mig_a"]
        );
    }

    #[tokio::test]
    async fn test_ledger_blank_lines_and_duplicates() {
        let (_dir, store) = store();
        tokio::fs::create_dir_all(store.dir()).await.unwrap();
        tokio::fs::write(store.ledger_path(), "mig_a\n\n  \nmig_b\n").await.unwrap();
        assert_eq!(store.list_local().await.unwrap(), vec!["mig_a", "mig_b"]);

        tokio::fs::write(store.ledger_path(), "mig_a\nmig_a\n").await.unwrap();
        let err = store.list_local().await.unwrap_err();
        assert!(matches!(err, MigrationError::CorruptMigration { .. }));
    }

    #[tokio::test]
    async fn test_invalid_json_aborts_load() {
        let (_dir, store) = store();
        store.write_migration(&new_record("mig_a", None, vec![]).into()).await.unwrap();
        tokio::fs::write(store.migration_path("mig_b").unwrap(), "{ not json").await.unwrap();
        store.write_ledger(&["mig_a", "mig_b"]).await.unwrap();

        let err = store.load_chain().await.unwrap_err();
        match err {
            MigrationError::CorruptMigration { path, .. } => {
                assert!(path.ends_with("mig_b.json"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_ledger_entry_without_file() {
        let (_dir, store) = store();
        store.write_ledger(&["mig_missing"]).await.unwrap();
        let err = store.load_chain().await.unwrap_err();
        assert!(matches!(err, MigrationError::CorruptMigration { .. }));
    }

    #[tokio::test]
    async fn test_malformed_checksum_is_corrupt() {
        let (_dir, store) = store();
        tokio::fs::create_dir_all(store.dir()).await.unwrap();
        tokio::fs::write(
            store.migration_path("mig_a").unwrap(),
            r#"{"id": "mig_a", "checksum": "deadbeef", "operations": []}"#,
        )
        .await
        .unwrap();

        let err = store.read_migration("mig_a").await.unwrap_err();
        assert!(err.to_string().contains("checksum"));
    }

    fn pgroll(name: &str) -> Migration {
        PgRollMigration {
            name: name.into(),
            parent: None,
            migration: format!(r#"{{"name": "{}", "operations": []}}"#, name),
            done: true,
            migration_type: PgRollMigrationType::Pgroll,
            started_at: None,
        }
        .into()
    }

    #[tokio::test]
    async fn test_replace_all_swaps_chain() {
        let (_dir, store) = store();
        store.write_migration(&new_record("mig_old", None, vec![]).into()).await.unwrap();
        store.write_ledger(&["mig_old"]).await.unwrap();
        tokio::fs::write(store.dir().join("README.md"), "notes").await.unwrap();

        store.replace_all(&[pgroll("mig_a")]).await.unwrap();

        assert_eq!(store.list_local().await.unwrap(), vec!["mig_a"]);
        assert!(store.read_migration("mig_a").await.unwrap().is_pgroll());
        assert!(!store.migration_path("mig_old").unwrap().exists());
        assert!(!store.dir().join(STAGING_DIR).exists());
        assert!(store.dir().join("README.md").exists());
    }

    #[tokio::test]
    async fn test_failed_replace_keeps_local_files() {
        let (_dir, store) = store();
        let keep: Migration = new_record("mig_keep", None, vec![]).into();
        store.write_migration(&keep).await.unwrap();
        store.write_ledger(&["mig_keep"]).await.unwrap();

        let err = store
            .replace_all(&[pgroll("mig_a"), pgroll("no/such/dir")])
            .await
            .unwrap_err();
        assert!(matches!(err, MigrationError::CorruptMigration { .. }));

        assert_eq!(store.list_local().await.unwrap(), vec!["mig_keep"]);
        assert_eq!(store.read_migration("mig_keep").await.unwrap(), keep);
        assert!(!store.migration_path("mig_a").unwrap().exists());
        assert!(!store.dir().join(STAGING_DIR).exists());
    }

    #[test]
    fn test_check_id() {
        assert!(check_id("mig_cd8ifsnd0j0u1oqfrkg0").is_ok());
        for bad in ["", ".", "..", "../escaped", "a/b", "a\\b", "/abs"] {
            assert!(check_id(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[tokio::test]
    async fn test_ledger_entry_outside_dir_is_corrupt() {
        let (_dir, store) = store();
        store.write_ledger(&["../escaped"]).await.unwrap();

        let err = store.list_local().await.unwrap_err();
        assert!(matches!(err, MigrationError::CorruptMigration { .. }));
        assert!(store.migration_path("../escaped").is_err());
    }
}
