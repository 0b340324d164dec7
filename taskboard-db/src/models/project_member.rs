/// ProjectMember model
///
/// Membership of a user in a project. A user is a member of a project at
/// most once.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE project_role AS ENUM ('OWNER', 'MEMBER');
///
/// CREATE TABLE project_members (
///     id UUID PRIMARY KEY,
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     role project_role NOT NULL DEFAULT 'MEMBER',
///     joined_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     UNIQUE (project_id, user_id)
/// );
/// ```

use super::{assign, or_default, CreateInput, Model, UniqueKey, UpdateInput};
use crate::query::{DbEnum, Field, IntoValue, Value};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of a member within a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectRole {
    /// Full control over the project
    Owner,

    /// Works on tasks
    Member,
}

impl ProjectRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectRole::Owner => "OWNER",
            ProjectRole::Member => "MEMBER",
        }
    }

    /// Can invite and remove members
    pub fn can_manage_members(&self) -> bool {
        matches!(self, ProjectRole::Owner)
    }
}

impl DbEnum for ProjectRole {
    const TYPE_NAME: &'static str = "project_role";

    fn label(&self) -> &'static str {
        self.as_str()
    }
}

crate::impl_db_enum_value!(ProjectRole);

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectMember {
    pub id: Uuid,
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub role: ProjectRole,
    pub joined_at: DateTime<Utc>,
}

/// Input for adding a member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectMember {
    pub id: Option<Uuid>,
    pub project_id: Uuid,
    pub user_id: Uuid,
    /// Defaults to `Member`
    pub role: Option<ProjectRole>,
}

impl CreateProjectMember {
    pub fn new(project_id: Uuid, user_id: Uuid, role: ProjectRole) -> Self {
        Self {
            id: None,
            project_id,
            user_id,
            role: Some(role),
        }
    }
}

impl CreateInput for CreateProjectMember {
    fn into_values(self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", self.id.unwrap_or_else(Uuid::new_v4).into_value()),
            ("project_id", self.project_id.into_value()),
            ("user_id", self.user_id.into_value()),
            ("role", or_default(self.role)),
            ("joined_at", or_default(None::<DateTime<Utc>>)),
        ]
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProjectMember {
    pub role: Option<ProjectRole>,
}

impl UpdateInput for UpdateProjectMember {
    fn into_assignments(self) -> Vec<(&'static str, Value)> {
        let mut out = Vec::new();
        assign(&mut out, "role", self.role);
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProjectMemberUnique {
    Id(Uuid),
    ProjectUser { project_id: Uuid, user_id: Uuid },
}

impl UniqueKey for ProjectMemberUnique {
    fn columns(&self) -> Vec<(&'static str, Value)> {
        match self {
            ProjectMemberUnique::Id(id) => vec![("id", (*id).into_value())],
            ProjectMemberUnique::ProjectUser {
                project_id,
                user_id,
            } => vec![
                ("project_id", (*project_id).into_value()),
                ("user_id", (*user_id).into_value()),
            ],
        }
    }
}

impl Model for ProjectMember {
    const NAME: &'static str = "ProjectMember";
    const TABLE: &'static str = "project_members";
    const PRIMARY_KEY: &'static [&'static str] = &["id"];

    type Unique = ProjectMemberUnique;
    type Create = CreateProjectMember;
    type Update = UpdateProjectMember;
}

pub mod fields {
    use super::*;

    pub const ID: Field<ProjectMember, Uuid> = Field::new("id");
    pub const PROJECT_ID: Field<ProjectMember, Uuid> = Field::new("project_id");
    pub const USER_ID: Field<ProjectMember, Uuid> = Field::new("user_id");
    pub const ROLE: Field<ProjectMember, ProjectRole> = Field::new("role");
    pub const JOINED_AT: Field<ProjectMember, DateTime<Utc>> = Field::new("joined_at");
}

pub mod relations {
    use super::ProjectMember;
    use crate::models::project::Project;
    use crate::models::user::User;
    use crate::query::Relation;

    pub const PROJECT: Relation<ProjectMember, Project> = Relation::new("project_id", "id");
    pub const USER: Relation<ProjectMember, User> = Relation::new("user_id", "id");
}
