//! Database URL parsing.
//!
//! Databases are addressed as `https://{workspace}.{region}.xata.sh/db/{database}`,
//! optionally suffixed with `:{branch}`.

use std::fmt;

use url::Url;

use crate::error::{ClientError, ClientResult};

/// A parsed database URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseUrl {
    scheme: String,
    host: String,
    port: Option<u16>,
    workspace: String,
    region: String,
    database: String,
    branch: Option<String>,
}

impl DatabaseUrl {
    /// Parse a database URL.
    pub fn parse(raw: &str) -> ClientResult<Self> {
        let url = Url::parse(raw).map_err(|e| ClientError::invalid_url(raw, e.to_string()))?;

        let host = url
            .host_str()
            .ok_or_else(|| ClientError::invalid_url(raw, "missing host"))?
            .to_string();

        let mut labels = host.split('.');
        let (workspace, region) = match (labels.next(), labels.next(), labels.next()) {
            (Some(ws), Some(region), Some(_)) if !ws.is_empty() && !region.is_empty() => {
                (ws.to_string(), region.to_string())
            }
            _ => {
                return Err(ClientError::invalid_url(
                    raw,
                    "expected host of the form {workspace}.{region}.{domain}",
                ));
            }
        };

        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|p| !p.is_empty()).collect())
            .unwrap_or_default();

        let db_segment = match segments.as_slice() {
            ["db", db] => *db,
            _ => return Err(ClientError::invalid_url(raw, "expected path /db/{database}")),
        };

        let (database, branch) = match db_segment.split_once(':') {
            Some((db, branch)) if !branch.is_empty() => (db.to_string(), Some(branch.to_string())),
            Some((db, _)) => (db.to_string(), None),
            None => (db_segment.to_string(), None),
        };

        if database.is_empty() {
            return Err(ClientError::invalid_url(raw, "missing database name"));
        }

        Ok(Self {
            scheme: url.scheme().to_string(),
            host,
            port: url.port(),
            workspace,
            region,
            database,
            branch,
        })
    }

    /// Workspace identifier.
    pub fn workspace(&self) -> &str {
        &self.workspace
    }

    /// Region the workspace lives in.
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Database name.
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Branch embedded in the URL, if any.
    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }

    /// Scheme, host and port without a trailing slash.
    pub fn origin(&self) -> String {
        match self.port {
            Some(port) => format!("{}://{}:{}", self.scheme, self.host, port),
            None => format!("{}://{}", self.scheme, self.host),
        }
    }

    /// Base endpoint for every branch-scoped API call.
    pub fn branch_endpoint(&self, branch: &str) -> String {
        format!("{}/db/{}:{}", self.origin(), self.database, branch)
    }
}

impl fmt::Display for DatabaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/db/{}", self.origin(), self.database)?;
        if let Some(branch) = &self.branch {
            write!(f, ":{}", branch)?;
        }
        Ok(())
    }
}
