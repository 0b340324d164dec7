/// Database models
///
/// Each module defines one model: its row struct, typed `fields` and
/// `relations` handles for filtering, a unique-key enum, and create/update
/// inputs. The generic operations over them live on
/// [`Delegate`](crate::delegate::Delegate).
///
/// # Models
///
/// - `user`: identities, optionally with a password hash
/// - `account`: external auth-provider linkage owned by a user
/// - `session`: login sessions keyed by a session token
/// - `verification_token`: out-of-band verification tokens
/// - `post`: named records created by a user
/// - `project`: projects owned by a user
/// - `project_member`: user membership in a project, with a role
/// - `project_invitation`: invitations from one user to another
/// - `task`: tasks with creator, optional assignee and project
///
/// # Example
///
/// ```no_run
/// use taskboard_db::client::Client;
/// use taskboard_db::models::user::CreateUser;
///
/// # async fn example(client: Client) -> Result<(), Box<dyn std::error::Error>> {
/// let user = client
///     .user()
///     .create(CreateUser::with_password("user@example.com", "correct horse battery")?)
///     .await?;
/// println!("Created user: {}", user.id);
/// # Ok(())
/// # }
/// ```

use crate::error::DbResult;
use crate::query::{IntoValue, Value};
use sqlx::postgres::PgRow;
use sqlx::FromRow;

pub mod account;
pub mod post;
pub mod project;
pub mod project_invitation;
pub mod project_member;
pub mod session;
pub mod task;
pub mod user;
pub mod verification_token;

/// A table mapped to a row struct.
pub trait Model: for<'r> FromRow<'r, PgRow> + Send + Unpin + 'static {
    /// Model name used in errors and logs
    const NAME: &'static str;

    /// Table name
    const TABLE: &'static str;

    /// Primary key columns (or the leading unique key for tables without one)
    const PRIMARY_KEY: &'static [&'static str];

    /// Column refreshed to NOW() on every update
    const UPDATED_AT: Option<&'static str> = None;

    type Unique: UniqueKey;
    type Create: CreateInput;
    type Update: UpdateInput;
}

/// Identifies at most one row by a unique column set.
pub trait UniqueKey: Send {
    fn columns(&self) -> Vec<(&'static str, Value)>;
}

/// Column values for a new row.
///
/// Columns left to the database default are reported as `Value::Default`.
pub trait CreateInput: Send {
    /// Checks the input before it is sent
    fn validate_input(&self) -> DbResult<()> {
        Ok(())
    }

    fn into_values(self) -> Vec<(&'static str, Value)>;
}

/// Column assignments for an update; only fields that are set appear.
pub trait UpdateInput: Send {
    fn into_assignments(self) -> Vec<(&'static str, Value)>;
}

/// `Value::Default` when unset, so the column default applies.
pub(crate) fn or_default<T: IntoValue>(value: Option<T>) -> Value {
    value.map_or(Value::Default, IntoValue::into_value)
}

/// Pushes an assignment when the field is set.
pub(crate) fn assign<T: IntoValue>(
    out: &mut Vec<(&'static str, Value)>,
    column: &'static str,
    value: Option<T>,
) {
    if let Some(value) = value {
        out.push((column, value.into_value()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_or_default() {
        assert_eq!(or_default(None::<i32>), Value::Default);
        assert_eq!(or_default(Some(3i32)), Value::Int(Some(3)));
    }

    #[test]
    fn test_assign_clears_with_some_none() {
        let mut out = Vec::new();
        assign(&mut out, "name", None::<Option<String>>);
        assign(&mut out, "image", Some(None::<String>));
        assert_eq!(out, vec![("image", Value::Text(None))]);
    }
}
