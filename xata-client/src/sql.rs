//! SQL queries executed through the service's SQL proxy.
//!
//! Queries are always parameterized: values bound with [`SqlQuery::bind`] or
//! the [`sql!`](crate::sql!) macro travel in the `params` array and are never
//! interpolated into the statement text.
//!
//! ```rust
//! use xata_client::sql;
//!
//! let name = "'; DROP TABLE teams; --";
//! let query = sql!("SELECT * FROM teams WHERE name = {} AND size > {}", name, 3);
//!
//! assert_eq!(query.statement(), "SELECT * FROM teams WHERE name = $1 AND size > $2");
//! assert_eq!(query.params().len(), 2);
//! assert!(!query.statement().contains("DROP TABLE"));
//! ```

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Consistency level for a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Consistency {
    /// Read from the primary.
    #[default]
    Strong,
    /// Allow reads from replicas.
    Eventual,
}

/// Shape of returned rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Rows as JSON objects keyed by column name.
    #[default]
    Json,
    /// Rows as positional arrays.
    Array,
}

/// A parameterized SQL query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SqlQuery {
    statement: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    params: Vec<Value>,
    consistency: Consistency,
    response_type: ResponseType,
}

impl SqlQuery {
    /// Create a query from a statement.
    pub fn new(statement: impl Into<String>) -> Self {
        Self {
            statement: statement.into(),
            ..Default::default()
        }
    }

    /// Append literal SQL.
    pub fn push(mut self, sql: &str) -> Self {
        self.statement.push_str(sql);
        self
    }

    /// Bind a value for an existing `$N` placeholder.
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }

    /// Append the next `$N` placeholder and bind its value.
    pub fn push_bind(mut self, value: impl Into<Value>) -> Self {
        let index = self.params.len() + 1;
        self.statement.push_str(&placeholder(index));
        self.params.push(value.into());
        self
    }

    /// Set the consistency level.
    pub fn consistency(mut self, consistency: Consistency) -> Self {
        self.consistency = consistency;
        self
    }

    /// Set the response type.
    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = response_type;
        self
    }

    /// The statement text.
    pub fn statement(&self) -> &str {
        &self.statement
    }

    /// The bound parameters.
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Check if the statement is blank.
    pub fn is_empty(&self) -> bool {
        self.statement.trim().is_empty()
    }

    /// Build a query from a `{}`-template and its values, in order.
    ///
    /// Surplus values are still bound so the service can report the mismatch.
    pub fn from_template(template: &str, values: Vec<Value>) -> Self {
        let parts: Vec<&str> = template.split("{}").collect();
        let mut query = Self::default();
        let mut values = values.into_iter();

        for (i, part) in parts.iter().enumerate() {
            query = query.push(part);
            if i < parts.len() - 1 {
                if let Some(value) = values.next() {
                    query = query.push_bind(value);
                }
            }
        }

        for value in values {
            query = query.bind(value);
        }

        debug!(
            statement_len = query.statement.len(),
            param_count = query.params.len(),
            "SqlQuery::from_template()"
        );
        query
    }
}

/// Postgres positional placeholder for a 1-based index.
fn placeholder(index: usize) -> String {
    format!("${}", index)
}

/// Build a [`SqlQuery`] from a `{}`-template, binding each argument as a parameter.
#[macro_export]
macro_rules! sql {
    ($sql:expr) => {
        $crate::sql::SqlQuery::new($sql)
    };

    ($sql:expr, $($params:expr),+ $(,)?) => {
        $crate::sql::SqlQuery::from_template(
            $sql,
            vec![$($crate::serde_json::Value::from($params)),+],
        )
    };
}
