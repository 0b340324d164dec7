/// Error types for the data-access client
///
/// Every delegate and client operation returns `DbResult<T>`. Constraint
/// violations reported by Postgres are mapped to dedicated variants carrying
/// the model name, so callers can match on them without inspecting SQLSTATE
/// codes themselves.
///
/// # Example
///
/// ```no_run
/// use taskboard_db::client::Client;
/// use taskboard_db::error::DbError;
/// use taskboard_db::models::user::UserUnique;
/// use uuid::Uuid;
///
/// # async fn example(client: Client) -> Result<(), DbError> {
/// match client.user().find_unique_or_throw(UserUnique::Id(Uuid::new_v4())).await {
///     Ok(user) => println!("found {}", user.id),
///     Err(e) if e.is_not_found() => println!("no such user"),
///     Err(e) => return Err(e),
/// }
/// # Ok(())
/// # }
/// ```

use crate::auth::password::PasswordError;
use sqlx::postgres::PgDatabaseError;

/// Result alias used throughout the crate
pub type DbResult<T> = Result<T, DbError>;

/// SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

/// SQLSTATE for foreign_key_violation
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// SQLSTATE for not_null_violation
const NOT_NULL_VIOLATION: &str = "23502";

/// Unified error type for database operations
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A record required by the operation does not exist
    #[error("{model} not found ({operation})")]
    NotFound {
        model: &'static str,
        operation: &'static str,
    },

    /// A unique constraint rejected the write
    #[error("unique constraint violated on {model}: {constraint}")]
    UniqueViolation {
        model: &'static str,
        constraint: String,
    },

    /// A foreign key points at a missing parent record
    #[error("foreign key constraint violated on {model}: {constraint}")]
    ForeignKeyViolation {
        model: &'static str,
        constraint: String,
    },

    /// A required column was written as NULL
    #[error("null value for required column {model}.{column}")]
    NullViolation {
        model: &'static str,
        column: String,
    },

    /// Input data failed validation before reaching the database
    #[error("validation failed: {0}")]
    Validation(String),

    /// The query arguments are inconsistent
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// A transaction was started from a transaction-scoped client
    #[error("nested transactions are not supported")]
    NestedTransaction,

    /// A transaction-scoped client was used after commit or rollback
    #[error("transaction already closed")]
    TransactionClosed,

    /// The transaction did not start or finish in time
    #[error("transaction timed out while {0}")]
    TransactionTimeout(&'static str),

    /// Password hashing or verification failed
    #[error(transparent)]
    Password(#[from] PasswordError),

    /// Any other database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A migration failed
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

impl DbError {
    /// Maps a sqlx error raised while operating on `model`
    ///
    /// Constraint violations become their dedicated variants; everything else
    /// is wrapped in `DbError::Database`.
    pub fn from_sqlx(model: &'static str, err: sqlx::Error) -> Self {
        let Some(db_err) = err.as_database_error() else {
            return DbError::Database(err);
        };

        let constraint = db_err.constraint().unwrap_or_default().to_string();
        match db_err.code().as_deref() {
            Some(UNIQUE_VIOLATION) => DbError::UniqueViolation { model, constraint },
            Some(FOREIGN_KEY_VIOLATION) => DbError::ForeignKeyViolation { model, constraint },
            Some(NOT_NULL_VIOLATION) => {
                let column = db_err
                    .try_downcast_ref::<PgDatabaseError>()
                    .and_then(|pg| pg.column())
                    .unwrap_or_default()
                    .to_string();
                DbError::NullViolation { model, column }
            }
            _ => DbError::Database(err),
        }
    }

    /// Creates a not-found error
    pub fn not_found(model: &'static str, operation: &'static str) -> Self {
        DbError::NotFound { model, operation }
    }

    /// True if the error reports a missing record
    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound { .. })
    }

    /// True if the error reports a unique constraint violation
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DbError::UniqueViolation { .. })
    }
}

impl From<validator::ValidationErrors> for DbError {
    fn from(errors: validator::ValidationErrors) -> Self {
        DbError::Validation(errors.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = DbError::not_found("Task", "update");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Task not found (update)");
    }

    #[test]
    fn test_non_database_error_passes_through() {
        let err = DbError::from_sqlx("User", sqlx::Error::RowNotFound);
        assert!(matches!(err, DbError::Database(sqlx::Error::RowNotFound)));
        assert!(!err.is_unique_violation());
    }

    #[test]
    fn test_unique_violation_display() {
        let err = DbError::UniqueViolation {
            model: "User",
            constraint: "users_email_key".to_string(),
        };
        assert!(err.is_unique_violation());
        assert_eq!(
            err.to_string(),
            "unique constraint violated on User: users_email_key"
        );
    }
}
