//! # xata-migrate
//!
//! Migration reconciliation between a local migrations directory and a Xata
//! branch.
//!
//! This crate provides functionality for:
//! - Loading the remote history (paginated legacy logs or the pgroll list)
//!   and ordering it root to tip
//! - Reading and writing local migration files in ledger order
//! - Diffing the two chains and detecting divergence
//! - Gating on the branch's migration format (legacy vs. pgroll)
//! - Pushing local-only migrations and pulling remote ones
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌────────────────┐     ┌──────────────┐
//! │ Local Store  │────▶│  Format Gate   │────▶│ Chain Differ │
//! └──────────────┘     └────────────────┘     └──────────────┘
//!                              ▲                     │
//!                              │                     ▼
//!                      ┌────────────────┐     ┌──────────────┐
//!                      │ History Loader │     │ Push Executor│
//!                      └────────────────┘     └──────────────┘
//!                              ▲                     │
//!                              └──── MigrationRemote ◀┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use xata_client::{ClientConfig, XataClient};
//! use xata_migrate::{LocalMigrationStore, Reconciler};
//!
//! async fn push() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = XataClient::new(ClientConfig::from_env()?)?;
//!     let reconciler = Reconciler::new(
//!         client.branch("main"),
//!         LocalMigrationStore::new(".xata/migrations"),
//!     );
//!
//!     let outcome = reconciler.push().await?;
//!     println!("{}", outcome.summary());
//!     Ok(())
//! }
//! ```
//!
//! ## Migration Files
//!
//! ```text
//! .xata/migrations/
//! ├── .ledger                       # identifiers, root first
//! ├── mig_cd8ifrnd0j0u1oqfrkf0.json
//! └── mig_cd8ifsnd0j0u1oqfrkg0.json
//! ```

pub mod diff;
pub mod engine;
pub mod error;
pub mod file;
pub mod format;
pub mod history;
pub mod migration;
pub mod remote;

// Re-exports
pub use diff::{ChainDiff, diff_chains, diff_migrations};
pub use engine::{PullOutcome, PushOutcome, PushPlan, Reconciler, execute_push};
pub use error::{MigrateResult, MigrationError, PGROLL_REMEDIATION};
pub use file::{DEFAULT_MIGRATIONS_DIR, LEDGER_FILE, LocalMigrationStore, check_id};
pub use format::{detect_mode, validate_local_format};
pub use history::{HistoryLoader, MigrationRemote, build_chain, load_history};
pub use migration::{
    Migration, MigrationMode, MigrationRecord, PgRollMigration, PgRollMigrationType,
    compute_checksum, new_record, parse_checksum,
};
