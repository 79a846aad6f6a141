//! Remote migration history.

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use tracing::debug;
use xata_client::{
    BranchDetails, MigrationHistoryPage, PgRollApplyResponse, PushMigrationsResponse,
};

use crate::error::{MigrateResult, MigrationError};
use crate::migration::{Migration, MigrationMode, MigrationRecord, PgRollMigration};

/// Default number of entries requested per history page.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Default upper bound on history pages followed in one load.
pub const DEFAULT_MAX_PAGES: usize = 10_000;

/// The remote side of reconciliation: one branch of one database.
#[async_trait::async_trait]
pub trait MigrationRemote: Send + Sync {
    /// Name of the branch, for messages.
    fn branch(&self) -> &str;

    /// Get branch metadata and schema.
    async fn branch_details(&self) -> MigrateResult<BranchDetails>;

    /// Get one page of the legacy history.
    async fn history_page(
        &self,
        cursor: Option<&str>,
        size: u32,
    ) -> MigrateResult<MigrationHistoryPage>;

    /// Push legacy migrations as one batch.
    async fn push_migrations(
        &self,
        migrations: &[MigrationRecord],
    ) -> MigrateResult<PushMigrationsResponse>;

    /// Start a pgroll job for one migration payload.
    async fn pgroll_apply(&self, payload: &Value) -> MigrateResult<PgRollApplyResponse>;

    /// List pgroll migrations.
    async fn pgroll_migrations(&self) -> MigrateResult<Vec<PgRollMigration>>;
}

/// Loads the full remote history.
#[derive(Debug, Clone, Copy)]
pub struct HistoryLoader {
    page_size: u32,
    max_pages: usize,
}

impl Default for HistoryLoader {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

impl HistoryLoader {
    /// Create a loader with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page size.
    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = size.max(1);
        self
    }

    /// Set the page cap.
    pub fn max_pages(mut self, pages: usize) -> Self {
        self.max_pages = pages;
        self
    }

    /// Load every remote migration, in transport order.
    pub async fn load<R>(&self, remote: &R, mode: MigrationMode) -> MigrateResult<Vec<Migration>>
    where
        R: MigrationRemote + ?Sized,
    {
        match mode {
            MigrationMode::Legacy => self.load_legacy(remote).await,
            MigrationMode::PgRoll => {
                let migrations = remote.pgroll_migrations().await?;
                debug!(count = migrations.len(), "Loaded pgroll history");
                Ok(migrations.into_iter().map(Migration::PgRoll).collect())
            }
        }
    }

    async fn load_legacy<R>(&self, remote: &R) -> MigrateResult<Vec<Migration>>
    where
        R: MigrationRemote + ?Sized,
    {
        let mut records = Vec::new();
        let mut cursor: Option<String> = None;

        for page_number in 0..self.max_pages {
            let page = remote.history_page(cursor.as_deref(), self.page_size).await?;
            debug!(
                page = page_number,
                entries = page.logs.len(),
                more = page.meta.more,
                "Fetched history page"
            );
            records.extend(page.logs.into_iter().map(Migration::Legacy));

            if !page.meta.more {
                return Ok(records);
            }
            if page.meta.cursor.is_none() {
                return Err(MigrationError::invalid_history(
                    "history page reports more entries but no cursor",
                ));
            }
            cursor = page.meta.cursor;
        }

        Err(MigrationError::invalid_history(format!(
            "history did not end after {} pages",
            self.max_pages
        )))
    }
}

/// Load the remote history with default settings.
pub async fn load_history<R>(remote: &R, mode: MigrationMode) -> MigrateResult<Vec<Migration>>
where
    R: MigrationRemote + ?Sized,
{
    HistoryLoader::default().load(remote, mode).await
}

/// Order migrations root to tip by following parent links.
///
/// The input order is ignored. The records must form exactly one linear chain.
pub fn build_chain(migrations: Vec<Migration>) -> MigrateResult<Vec<Migration>> {
    if migrations.is_empty() {
        return Ok(migrations);
    }

    let mut ids = HashSet::new();
    for migration in &migrations {
        if !ids.insert(migration.id().to_string()) {
            return Err(MigrationError::invalid_history(format!(
                "migration {} appears more than once",
                migration.id()
            )));
        }
    }

    let mut root = None;
    let mut children: HashMap<String, usize> = HashMap::new();
    for (index, migration) in migrations.iter().enumerate() {
        match migration.parent().filter(|parent| ids.contains(*parent)) {
            None => {
                if let Some(existing) = root.replace(index) {
                    let existing: &Migration = &migrations[existing];
                    return Err(MigrationError::invalid_history(format!(
                        "multiple roots: {} and {}",
                        existing.id(),
                        migration.id()
                    )));
                }
            }
            Some(parent) => {
                if children.insert(parent.to_string(), index).is_some() {
                    return Err(MigrationError::invalid_history(format!(
                        "fork at migration {}",
                        parent
                    )));
                }
            }
        }
    }

    let Some(mut current) = root else {
        return Err(MigrationError::invalid_history("no root migration (cycle)"));
    };

    let mut order = Vec::with_capacity(migrations.len());
    loop {
        order.push(current);
        match children.get(migrations[current].id()) {
            Some(&next) => current = next,
            None => break,
        }
    }

    if order.len() != migrations.len() {
        return Err(MigrationError::invalid_history(format!(
            "{} migrations are not reachable from the root",
            migrations.len() - order.len()
        )));
    }

    let mut slots: Vec<Option<Migration>> = migrations.into_iter().map(Some).collect();
    Ok(order
        .into_iter()
        .filter_map(|index| slots[index].take())
        .collect())
}


#[cfg(test)]
mod tests {
    use super::fake::FakeRemote;
    use super::*;
    use crate::migration::new_record;
    use pretty_assertions::assert_eq;
    use xata_client::PageMeta;

    fn chain(ids: &[&str]) -> Vec<MigrationRecord> {
        let mut parent: Option<&str> = None;
        ids.iter()
            .map(|id| {
                let record = new_record(*id, parent, vec![]);
                parent = Some(*id);
                record
            })
            .collect()
    }

    fn ids(migrations: &[Migration]) -> Vec<&str> {
        migrations.iter().map(Migration::id).collect()
    }

    #[tokio::test]
    async fn test_paginated_history_concatenates_pages() {
        let records = chain(&["mig_a", "mig_b", "mig_c"]);
        let mut remote = FakeRemote::legacy(vec![]);
        remote.pages = vec![
            MigrationHistoryPage {
                meta: PageMeta { cursor: Some("c1".into()), more: true },
                logs: records[..2].to_vec(),
            },
            MigrationHistoryPage {
                meta: PageMeta { cursor: Some("c2".into()), more: false },
                logs: records[2..].to_vec(),
            },
        ];

        let history = load_history(&remote, MigrationMode::Legacy).await.unwrap();
        assert_eq!(ids(&history), vec!["mig_a", "mig_b", "mig_c"]);
        assert_eq!(
            *remote.history_calls.lock().unwrap(),
            vec![None, Some("c1".to_string())]
        );
    }

    #[tokio::test]
    async fn test_empty_history_is_valid() {
        let remote = FakeRemote::legacy(vec![]);
        assert!(load_history(&remote, MigrationMode::Legacy).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_page_cap() {
        let mut remote = FakeRemote::legacy(vec![]);
        remote.pages = vec![
            MigrationHistoryPage {
                meta: PageMeta { cursor: Some("c".into()), more: true },
                logs: vec![],
            };
            5
        ];

        let err = HistoryLoader::new()
            .max_pages(3)
            .load(&remote, MigrationMode::Legacy)
            .await
            .unwrap_err();
        assert!(matches!(err, MigrationError::InvalidHistory(_)));
    }

    #[tokio::test]
    async fn test_remote_failure() {
        let mut remote = FakeRemote::legacy(vec![]);
        remote.fail = true;
        let err = load_history(&remote, MigrationMode::Legacy).await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_build_chain_reorders() {
        let mut records = chain(&["mig_a", "mig_b", "mig_c"]);
        records.reverse();
        let migrations = records.into_iter().map(Migration::Legacy).collect();

        let ordered = build_chain(migrations).unwrap();
        assert_eq!(ids(&ordered), vec!["mig_a", "mig_b", "mig_c"]);
    }

    #[test]
    fn test_build_chain_rejects_fork() {
        let mut records = chain(&["mig_a", "mig_b"]);
        records.push(new_record("mig_c", Some("mig_a"), vec![]));
        let err = build_chain(records.into_iter().map(Migration::Legacy).collect()).unwrap_err();
        assert!(err.to_string().contains("fork"));
    }

    #[test]
    fn test_build_chain_rejects_two_roots() {
        let records = vec![new_record("mig_a", None, vec![]), new_record("mig_b", None, vec![])];
        let err = build_chain(records.into_iter().map(Migration::Legacy).collect()).unwrap_err();
        assert!(err.to_string().contains("multiple roots"));
    }

    #[test]
    fn test_build_chain_rejects_cycle() {
        let records = vec![
            new_record("mig_a", None, vec![]),
            new_record("mig_b", Some("mig_c"), vec![]),
            new_record("mig_c", Some("mig_b"), vec![]),
        ];
        let err = build_chain(records.into_iter().map(Migration::Legacy).collect()).unwrap_err();
        assert!(matches!(err, MigrationError::InvalidHistory(_)));
    }
}
