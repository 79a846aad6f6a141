//! # Xata
//!
//! Typed Rust SDK and migration tooling for the Xata database service.
//!
//! Xata provides:
//! - A typed async API client with parameterized SQL and per-table record access
//! - Migration reconciliation between local files and a branch, in legacy and
//!   pgroll formats
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use xata::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = XataClient::new(ClientConfig::from_env()?)?;
//!     let branch = client.branch("main");
//!
//!     let teams = branch.sql(&sql!("SELECT * FROM teams WHERE size > {}", 3)).await?;
//!     println!("{} teams", teams.records.len());
//!
//!     let reconciler = Reconciler::new(branch, LocalMigrationStore::new(".xata/migrations"));
//!     println!("{}", reconciler.push().await?.summary());
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// API client, wire types and SQL builder.
pub mod client {
    pub use xata_client::*;
}

/// Migration reconciliation.
pub mod migrate {
    pub use xata_migrate::*;
}

pub use xata_client::sql;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::client::{
        BranchClient, ClientConfig, ClientError, Database, DatabaseUrl, SqlQuery, XataClient,
    };
    pub use crate::migrate::{
        LocalMigrationStore, Migration, MigrationError, MigrationMode, Reconciler,
    };
    pub use crate::sql;
}

// Re-export key types at the crate root
pub use xata_client::{ClientError, XataClient};
pub use xata_migrate::{MigrationError, Reconciler};
