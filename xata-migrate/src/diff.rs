//! Chain diffing between remote history and local files.

use crate::error::{MigrateResult, MigrationError};
use crate::migration::Migration;

/// Result of comparing two chains.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainDiff {
    /// Length of the shared prefix.
    pub common: usize,
    /// Identifiers present only on the source side, in chain order.
    pub new: Vec<String>,
}

impl ChainDiff {
    /// Check if there is nothing to transfer.
    pub fn is_empty(&self) -> bool {
        self.new.is_empty()
    }
}

/// Find the migrations `local` has beyond the end of `remote`.
///
/// A local chain that ends inside the shared prefix has nothing new, even when
/// `remote` continues past it. The chains have diverged only when both carry
/// entries past the shared prefix, which includes two chains with different
/// roots.
pub fn diff_chains<A, B>(remote: &[A], local: &[B]) -> MigrateResult<ChainDiff>
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    let common = common_prefix(remote, local);

    if local.len() <= common {
        return Ok(ChainDiff {
            common,
            new: Vec::new(),
        });
    }

    if remote.len() > common {
        return Err(divergence(
            remote[common].as_ref(),
            local.get(common).map(AsRef::as_ref),
        ));
    }

    Ok(ChainDiff {
        common,
        new: local[common..].iter().map(|id| id.as_ref().to_string()).collect(),
    })
}

/// Diff migration chains and return the local-only migrations.
///
/// Migrations in the shared prefix must carry matching checksums when both
/// sides have one.
pub fn diff_migrations(remote: &[Migration], local: &[Migration]) -> MigrateResult<Vec<Migration>> {
    let remote_ids: Vec<&str> = remote.iter().map(Migration::id).collect();
    let local_ids: Vec<&str> = local.iter().map(Migration::id).collect();
    let diff = diff_chains(&remote_ids, &local_ids)?;

    for (theirs, ours) in remote.iter().zip(local).take(diff.common) {
        if let (Some(expected), Some(actual)) = (theirs.checksum(), ours.checksum()) {
            if expected != actual {
                return Err(MigrationError::divergent(format!(
                    "migration {} was modified locally (checksum {} does not match remote {})",
                    ours.id(),
                    actual,
                    expected
                )));
            }
        }
    }

    Ok(local[diff.common..].to_vec())
}

fn common_prefix<A: AsRef<str>, B: AsRef<str>>(a: &[A], b: &[B]) -> usize {
    a.iter()
        .map(AsRef::<str>::as_ref)
        .zip(b.iter().map(AsRef::<str>::as_ref))
        .take_while(|(x, y)| x == y)
        .count()
}

fn divergence(remote_id: &str, local_id: Option<&str>) -> MigrationError {
    match local_id {
        Some(local_id) => MigrationError::divergent(format!(
            "remote migration {} conflicts with local migration {}",
            remote_id, local_id
        )),
        None => MigrationError::divergent(format!(
            "remote migration {} is missing locally",
            remote_id
        )),
    }
}
