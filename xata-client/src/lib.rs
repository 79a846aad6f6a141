//! # xata-client
//!
//! Typed async client for the Xata database service.
//!
//! This crate provides:
//! - Database URL parsing (`https://{workspace}.{region}.xata.sh/db/{db}[:{branch}]`)
//! - An authenticated JSON fetcher with uniform error mapping
//! - Branch-scoped endpoints for schema details, migration history, legacy
//!   push, and pgroll jobs
//! - Parameterized SQL queries via [`sql!`]
//! - Per-table record accessors resolved through an explicit registry
//!
//! ## Example
//!
//! ```rust,ignore
//! use xata_client::{ClientConfig, DatabaseUrl, XataClient, sql};
//!
//! async fn example() -> xata_client::ClientResult<()> {
//!     let url = DatabaseUrl::parse("https://my-ws.us-east-1.xata.sh/db/app")?;
//!     let client = XataClient::new(ClientConfig::new("xau_...", url))?;
//!     let branch = client.branch("main");
//!
//!     let details = branch.details().await?;
//!     println!("pgroll enabled: {}", details.use_pg_roll);
//!
//!     let rows = branch.sql(&sql!("SELECT * FROM teams WHERE name = {}", "core")).await?;
//!     println!("{} rows", rows.records.len());
//!
//!     let db = branch.database_from_schema().await?;
//!     let team = db.table("teams")?.read("rec_123").await?;
//!     println!("{team:?}");
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod database_url;
pub mod error;
pub mod fetcher;
pub mod logging;
pub mod schema;
pub mod sql;
pub mod types;

pub use client::{BranchClient, ClientConfig, XataClient};
pub use database_url::DatabaseUrl;
pub use error::{ClientError, ClientResult};
pub use fetcher::Fetcher;
pub use schema::{Database, TableRepository};
pub use sql::{Consistency, ResponseType, SqlQuery};
pub use types::{
    BranchDetails, MigrationHistoryPage, MigrationRecord, PageMeta, PgRollApplyResponse,
    PgRollMigration, PgRollMigrationType, PushMigrationsResponse, SqlColumn, SqlResponse,
};

#[doc(hidden)]
pub use serde_json;
