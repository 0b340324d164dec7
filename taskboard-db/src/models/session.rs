/// Session model
///
/// A login session owned by one user, looked up by its session token.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE sessions (
///     id UUID PRIMARY KEY,
///     session_token TEXT NOT NULL UNIQUE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     expires TIMESTAMPTZ NOT NULL
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use chrono::Duration;
/// use taskboard_db::client::Client;
/// use taskboard_db::models::session::{CreateSession, SessionUnique};
/// use uuid::Uuid;
///
/// # async fn example(client: Client, user_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let session = client
///     .session()
///     .create(CreateSession::new(user_id, Duration::days(30)))
///     .await?;
///
/// // Later, on each request
/// let current = client
///     .session()
///     .find_unique(SessionUnique::SessionToken(session.session_token.clone()))
///     .await?
///     .filter(|s| !s.is_expired());
/// # Ok(())
/// # }
/// ```

use super::{assign, CreateInput, Model, UniqueKey, UpdateInput};
use crate::auth::token::generate_token;
use crate::query::{Field, IntoValue, Value};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A login session
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Session {
    pub id: Uuid,
    pub session_token: String,
    pub user_id: Uuid,
    pub expires: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        self.expires <= Utc::now()
    }
}

/// Input for creating a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSession {
    pub id: Option<Uuid>,
    pub session_token: String,
    pub user_id: Uuid,
    pub expires: DateTime<Utc>,
}

impl CreateSession {
    /// A session with a fresh random token, valid for `ttl`
    pub fn new(user_id: Uuid, ttl: Duration) -> Self {
        Self {
            id: None,
            session_token: generate_token(),
            user_id,
            expires: Utc::now() + ttl,
        }
    }
}

impl CreateInput for CreateSession {
    fn into_values(self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", self.id.unwrap_or_else(Uuid::new_v4).into_value()),
            ("session_token", self.session_token.into_value()),
            ("user_id", self.user_id.into_value()),
            ("expires", self.expires.into_value()),
        ]
    }
}

/// Input for updating a session; extending `expires` is the common case
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSession {
    pub session_token: Option<String>,
    pub user_id: Option<Uuid>,
    pub expires: Option<DateTime<Utc>>,
}

impl UpdateInput for UpdateSession {
    fn into_assignments(self) -> Vec<(&'static str, Value)> {
        let mut out = Vec::new();
        assign(&mut out, "session_token", self.session_token);
        assign(&mut out, "user_id", self.user_id);
        assign(&mut out, "expires", self.expires);
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionUnique {
    Id(Uuid),
    SessionToken(String),
}

impl UniqueKey for SessionUnique {
    fn columns(&self) -> Vec<(&'static str, Value)> {
        match self {
            SessionUnique::Id(id) => vec![("id", (*id).into_value())],
            SessionUnique::SessionToken(token) => {
                vec![("session_token", token.clone().into_value())]
            }
        }
    }
}

impl Model for Session {
    const NAME: &'static str = "Session";
    const TABLE: &'static str = "sessions";
    const PRIMARY_KEY: &'static [&'static str] = &["id"];

    type Unique = SessionUnique;
    type Create = CreateSession;
    type Update = UpdateSession;
}

pub mod fields {
    use super::*;

    pub const ID: Field<Session, Uuid> = Field::new("id");
    pub const SESSION_TOKEN: Field<Session, String> = Field::new("session_token");
    pub const USER_ID: Field<Session, Uuid> = Field::new("user_id");
    pub const EXPIRES: Field<Session, DateTime<Utc>> = Field::new("expires");
}

pub mod relations {
    use super::Session;
    use crate::models::user::User;
    use crate::query::Relation;

    pub const USER: Relation<Session, User> = Relation::new("user_id", "id");
}
