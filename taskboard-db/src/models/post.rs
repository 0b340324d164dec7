/// Post model
///
/// A named record created by a user.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE posts (
///     id UUID PRIMARY KEY,
///     name TEXT NOT NULL,
///     created_by_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use super::{assign, or_default, CreateInput, Model, UniqueKey, UpdateInput};
use crate::error::DbResult;
use crate::query::{Field, IntoValue, Value};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub name: String,
    pub created_by_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePost {
    pub id: Option<Uuid>,

    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    pub created_by_id: Uuid,
}

impl CreatePost {
    pub fn new(name: impl Into<String>, created_by_id: Uuid) -> Self {
        Self {
            id: None,
            name: name.into(),
            created_by_id,
        }
    }
}

impl CreateInput for CreatePost {
    fn validate_input(&self) -> DbResult<()> {
        Ok(self.validate()?)
    }

    fn into_values(self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", self.id.unwrap_or_else(Uuid::new_v4).into_value()),
            ("name", self.name.into_value()),
            ("created_by_id", self.created_by_id.into_value()),
            ("created_at", or_default(None::<DateTime<Utc>>)),
            ("updated_at", or_default(None::<DateTime<Utc>>)),
        ]
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePost {
    pub name: Option<String>,
    pub created_by_id: Option<Uuid>,
}

impl UpdateInput for UpdatePost {
    fn into_assignments(self) -> Vec<(&'static str, Value)> {
        let mut out = Vec::new();
        assign(&mut out, "name", self.name);
        assign(&mut out, "created_by_id", self.created_by_id);
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PostUnique {
    Id(Uuid),
}

impl UniqueKey for PostUnique {
    fn columns(&self) -> Vec<(&'static str, Value)> {
        match self {
            PostUnique::Id(id) => vec![("id", (*id).into_value())],
        }
    }
}

impl Model for Post {
    const NAME: &'static str = "Post";
    const TABLE: &'static str = "posts";
    const PRIMARY_KEY: &'static [&'static str] = &["id"];
    const UPDATED_AT: Option<&'static str> = Some("updated_at");

    type Unique = PostUnique;
    type Create = CreatePost;
    type Update = UpdatePost;
}

pub mod fields {
    use super::*;

    pub const ID: Field<Post, Uuid> = Field::new("id");
    pub const NAME: Field<Post, String> = Field::new("name");
    pub const CREATED_BY_ID: Field<Post, Uuid> = Field::new("created_by_id");
    pub const CREATED_AT: Field<Post, DateTime<Utc>> = Field::new("created_at");
    pub const UPDATED_AT: Field<Post, DateTime<Utc>> = Field::new("updated_at");
}

pub mod relations {
    use super::Post;
    use crate::models::user::User;
    use crate::query::Relation;

    pub const CREATED_BY: Relation<Post, User> = Relation::new("created_by_id", "id");
}
