/// Project model
///
/// A project is owned by one user and groups members, invitations and tasks.
/// Deleting a project removes its members and invitations; its tasks stay
/// behind with `project_id` cleared.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY,
///     name TEXT NOT NULL,
///     description TEXT,
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskboard_db::client::Client;
/// use taskboard_db::models::project::{fields, relations};
/// use taskboard_db::models::project_member;
/// use taskboard_db::query::FindArgs;
/// use uuid::Uuid;
///
/// # async fn example(client: Client, user_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// // Projects the user belongs to, newest first
/// let projects = client
///     .project()
///     .find_many(
///         FindArgs::new()
///             .filter(relations::MEMBERS.some(project_member::fields::USER_ID.equals(user_id)))
///             .order_by(fields::CREATED_AT.desc()),
///     )
///     .await?;
/// # Ok(())
/// # }
/// ```

use super::{assign, or_default, CreateInput, Model, UniqueKey, UpdateInput};
use crate::error::DbResult;
use crate::query::{Field, IntoValue, Value};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A project
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }
}

/// Input for creating a project
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateProject {
    pub id: Option<Uuid>,

    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,

    pub owner_id: Uuid,
}

impl CreateProject {
    pub fn new(name: impl Into<String>, owner_id: Uuid) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: None,
            owner_id,
        }
    }
}

impl CreateInput for CreateProject {
    fn validate_input(&self) -> DbResult<()> {
        Ok(self.validate()?)
    }

    fn into_values(self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", self.id.unwrap_or_else(Uuid::new_v4).into_value()),
            ("name", self.name.into_value()),
            ("description", self.description.into_value()),
            ("owner_id", self.owner_id.into_value()),
            ("created_at", or_default(None::<DateTime<Utc>>)),
            ("updated_at", or_default(None::<DateTime<Utc>>)),
        ]
    }
}

/// Input for updating a project
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    /// Transfers ownership
    pub owner_id: Option<Uuid>,
}

impl UpdateInput for UpdateProject {
    fn into_assignments(self) -> Vec<(&'static str, Value)> {
        let mut out = Vec::new();
        assign(&mut out, "name", self.name);
        assign(&mut out, "description", self.description);
        assign(&mut out, "owner_id", self.owner_id);
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProjectUnique {
    Id(Uuid),
}

impl UniqueKey for ProjectUnique {
    fn columns(&self) -> Vec<(&'static str, Value)> {
        match self {
            ProjectUnique::Id(id) => vec![("id", (*id).into_value())],
        }
    }
}

impl Model for Project {
    const NAME: &'static str = "Project";
    const TABLE: &'static str = "projects";
    const PRIMARY_KEY: &'static [&'static str] = &["id"];
    const UPDATED_AT: Option<&'static str> = Some("updated_at");

    type Unique = ProjectUnique;
    type Create = CreateProject;
    type Update = UpdateProject;
}

pub mod fields {
    use super::*;

    pub const ID: Field<Project, Uuid> = Field::new("id");
    pub const NAME: Field<Project, String> = Field::new("name");
    pub const DESCRIPTION: Field<Project, Option<String>> = Field::new("description");
    pub const OWNER_ID: Field<Project, Uuid> = Field::new("owner_id");
    pub const CREATED_AT: Field<Project, DateTime<Utc>> = Field::new("created_at");
    pub const UPDATED_AT: Field<Project, DateTime<Utc>> = Field::new("updated_at");
}

pub mod relations {
    use super::Project;
    use crate::models::project_invitation::ProjectInvitation;
    use crate::models::project_member::ProjectMember;
    use crate::models::task::Task;
    use crate::models::user::User;
    use crate::query::Relation;

    pub const OWNER: Relation<Project, User> = Relation::new("owner_id", "id");
    pub const MEMBERS: Relation<Project, ProjectMember> = Relation::new("id", "project_id");
    pub const INVITATIONS: Relation<Project, ProjectInvitation> =
        Relation::new("id", "project_id");
    pub const TASKS: Relation<Project, Task> = Relation::new("id", "project_id");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_project_values() {
        let owner = Uuid::new_v4();
        let values = CreateProject::new("Roadmap", owner).into_values();
        assert_eq!(values[1], ("name", Value::Text(Some("Roadmap".to_string()))));
        assert_eq!(values[2], ("description", Value::Text(None)));
        assert_eq!(values[3], ("owner_id", Value::Uuid(Some(owner))));
        assert_eq!(values[5], ("updated_at", Value::Default));
    }

    #[test]
    fn test_blank_name_rejected() {
        assert!(CreateProject::new("", Uuid::new_v4()).validate_input().is_err());
    }

    #[test]
    fn test_clear_description() {
        let update = UpdateProject {
            description: Some(None),
            ..Default::default()
        };
        assert_eq!(
            update.into_assignments(),
            vec![("description", Value::Text(None))]
        );
    }
}
