/// User model
///
/// Users are the identity record every other model hangs off: they own
/// accounts, sessions, posts and projects, create and receive tasks, and send
/// and receive project invitations. Email and password are optional so that
/// users created through an external provider need neither.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY,
///     name TEXT,
///     email TEXT UNIQUE,
///     email_verified TIMESTAMPTZ,
///     password TEXT,
///     image TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskboard_db::client::Client;
/// use taskboard_db::models::user::{fields, CreateUser, UserUnique};
///
/// # async fn example(client: Client) -> Result<(), Box<dyn std::error::Error>> {
/// let user = client
///     .user()
///     .create(CreateUser::with_password("user@example.com", "hunter2hunter2")?)
///     .await?;
///
/// let found = client
///     .user()
///     .find_unique(UserUnique::Email("user@example.com".to_string()))
///     .await?;
/// assert_eq!(found.map(|u| u.id), Some(user.id));
/// # Ok(())
/// # }
/// ```

use super::{assign, or_default, CreateInput, Model, UniqueKey, UpdateInput};
use crate::auth::password::{hash_password, verify_password, PasswordError};
use crate::error::DbResult;
use crate::query::{Field, IntoValue, Value};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A user account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,

    /// Display name
    pub name: Option<String>,

    /// Email address, unique when set
    pub email: Option<String>,

    /// When the email address was verified
    pub email_verified: Option<DateTime<Utc>>,

    /// Argon2id hash of the password, for credential sign-in
    #[serde(skip_serializing)]
    pub password: Option<String>,

    /// Avatar URL
    pub image: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Checks a plaintext password against the stored hash.
    ///
    /// Users without a password never match.
    pub fn verify_password(&self, password: &str) -> Result<bool, PasswordError> {
        match &self.password {
            Some(hash) => verify_password(password, hash),
            None => Ok(false),
        }
    }
}

/// Input for creating a user
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CreateUser {
    /// Generated when not given
    pub id: Option<Uuid>,

    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub email_verified: Option<DateTime<Utc>>,

    /// Password hash (NOT the plaintext password)
    pub password: Option<String>,

    pub image: Option<String>,
}

impl CreateUser {
    /// A user signing up with email and password; the password is hashed
    pub fn with_password(email: impl Into<String>, password: &str) -> Result<Self, PasswordError> {
        Ok(Self {
            email: Some(email.into()),
            password: Some(hash_password(password)?),
            ..Default::default()
        })
    }
}

impl CreateInput for CreateUser {
    fn validate_input(&self) -> DbResult<()> {
        Ok(self.validate()?)
    }

    fn into_values(self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", self.id.unwrap_or_else(Uuid::new_v4).into_value()),
            ("name", self.name.into_value()),
            ("email", self.email.into_value()),
            ("email_verified", self.email_verified.into_value()),
            ("password", self.password.into_value()),
            ("image", self.image.into_value()),
            ("created_at", or_default(None::<DateTime<Utc>>)),
            ("updated_at", or_default(None::<DateTime<Utc>>)),
        ]
    }
}

/// Input for updating a user
///
/// Only `Some` fields are written; `Some(None)` clears a nullable column.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUser {
    pub name: Option<Option<String>>,
    pub email: Option<Option<String>>,
    pub email_verified: Option<Option<DateTime<Utc>>>,
    /// New password hash
    pub password: Option<Option<String>>,
    pub image: Option<Option<String>>,
}

impl UpdateUser {
    /// Sets a new password, hashing the plaintext
    pub fn password(password: &str) -> Result<Self, PasswordError> {
        Ok(Self {
            password: Some(Some(hash_password(password)?)),
            ..Default::default()
        })
    }
}

impl UpdateInput for UpdateUser {
    fn into_assignments(self) -> Vec<(&'static str, Value)> {
        let mut out = Vec::new();
        assign(&mut out, "name", self.name);
        assign(&mut out, "email", self.email);
        assign(&mut out, "email_verified", self.email_verified);
        assign(&mut out, "password", self.password);
        assign(&mut out, "image", self.image);
        out
    }
}

/// Unique keys of users
#[derive(Debug, Clone, PartialEq)]
pub enum UserUnique {
    Id(Uuid),
    Email(String),
}

impl UniqueKey for UserUnique {
    fn columns(&self) -> Vec<(&'static str, Value)> {
        match self {
            UserUnique::Id(id) => vec![("id", (*id).into_value())],
            UserUnique::Email(email) => vec![("email", email.clone().into_value())],
        }
    }
}

impl Model for User {
    const NAME: &'static str = "User";
    const TABLE: &'static str = "users";
    const PRIMARY_KEY: &'static [&'static str] = &["id"];
    const UPDATED_AT: Option<&'static str> = Some("updated_at");

    type Unique = UserUnique;
    type Create = CreateUser;
    type Update = UpdateUser;
}

/// Column handles
pub mod fields {
    use super::*;

    pub const ID: Field<User, Uuid> = Field::new("id");
    pub const NAME: Field<User, Option<String>> = Field::new("name");
    pub const EMAIL: Field<User, Option<String>> = Field::new("email");
    pub const EMAIL_VERIFIED: Field<User, Option<DateTime<Utc>>> = Field::new("email_verified");
    pub const PASSWORD: Field<User, Option<String>> = Field::new("password");
    pub const IMAGE: Field<User, Option<String>> = Field::new("image");
    pub const CREATED_AT: Field<User, DateTime<Utc>> = Field::new("created_at");
    pub const UPDATED_AT: Field<User, DateTime<Utc>> = Field::new("updated_at");
}

/// Relation handles
pub mod relations {
    use super::User;
    use crate::models::account::Account;
    use crate::models::post::Post;
    use crate::models::project::Project;
    use crate::models::project_invitation::ProjectInvitation;
    use crate::models::project_member::ProjectMember;
    use crate::models::session::Session;
    use crate::models::task::Task;
    use crate::query::Relation;

    pub const ACCOUNTS: Relation<User, Account> = Relation::new("id", "user_id");
    pub const SESSIONS: Relation<User, Session> = Relation::new("id", "user_id");
    pub const POSTS: Relation<User, Post> = Relation::new("id", "created_by_id");
    pub const CREATED_TASKS: Relation<User, Task> = Relation::new("id", "created_by_id");
    pub const ASSIGNED_TASKS: Relation<User, Task> = Relation::new("id", "assigned_to_id");
    pub const OWNED_PROJECTS: Relation<User, Project> = Relation::new("id", "owner_id");
    pub const MEMBERSHIPS: Relation<User, ProjectMember> = Relation::new("id", "user_id");
    pub const SENT_INVITATIONS: Relation<User, ProjectInvitation> =
        Relation::new("id", "invited_by_id");
    pub const RECEIVED_INVITATIONS: Relation<User, ProjectInvitation> =
        Relation::new("id", "invited_user_id");
}
