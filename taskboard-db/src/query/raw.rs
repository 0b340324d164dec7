//! Raw SQL with bound parameters.

use super::build::BuiltQuery;
use super::{IntoValue, Value};

/// A hand-written statement with `$1..$n` placeholders.
///
/// ```no_run
/// use taskboard_db::query::RawQuery;
///
/// let query = RawQuery::new("SELECT id, title FROM tasks WHERE status = $1::task_status")
///     .bind("FINISHED");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RawQuery {
    sql: String,
    params: Vec<Value>,
}

impl RawQuery {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Binds the next placeholder
    pub fn bind(mut self, value: impl IntoValue) -> Self {
        self.params.push(value.into_value());
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The statement as written
    pub(crate) fn into_query(self) -> BuiltQuery {
        BuiltQuery {
            sql: self.sql,
            params: self.params,
        }
    }

    /// The statement wrapped so each row comes back as one JSON object
    pub(crate) fn into_json_query(self) -> BuiltQuery {
        BuiltQuery {
            sql: format!(
                "SELECT to_jsonb(\"raw\") FROM ({}) AS \"raw\"",
                self.sql.trim().trim_end_matches(';')
            ),
            params: self.params,
        }
    }
}
