/// ProjectInvitation model
///
/// An invitation from one user to another to join a project. There is at
/// most one invitation per (project, invited user).
///
/// # Schema
///
/// ```sql
/// CREATE TYPE invitation_status AS ENUM ('PENDING', 'ACCEPTED', 'DECLINED');
///
/// CREATE TABLE project_invitations (
///     id UUID PRIMARY KEY,
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     invited_by_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     invited_user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     status invitation_status NOT NULL DEFAULT 'PENDING',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     UNIQUE (project_id, invited_user_id)
/// );
/// ```

use super::{assign, or_default, CreateInput, Model, UniqueKey, UpdateInput};
use crate::query::{DbEnum, Field, IntoValue, Value};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Invitation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "invitation_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvitationStatus {
    /// Waiting for the invited user
    Pending,

    Accepted,

    Declined,
}

impl InvitationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationStatus::Pending => "PENDING",
            InvitationStatus::Accepted => "ACCEPTED",
            InvitationStatus::Declined => "DECLINED",
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, InvitationStatus::Pending)
    }

    /// Accepted or declined
    pub fn is_resolved(&self) -> bool {
        !self.is_pending()
    }
}

impl DbEnum for InvitationStatus {
    const TYPE_NAME: &'static str = "invitation_status";

    fn label(&self) -> &'static str {
        self.as_str()
    }
}

crate::impl_db_enum_value!(InvitationStatus);

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectInvitation {
    pub id: Uuid,
    pub project_id: Uuid,
    pub invited_by_id: Uuid,
    pub invited_user_id: Uuid,
    pub status: InvitationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectInvitation {
    pub id: Option<Uuid>,
    pub project_id: Uuid,
    pub invited_by_id: Uuid,
    pub invited_user_id: Uuid,
    /// Defaults to `Pending`
    pub status: Option<InvitationStatus>,
}

impl CreateProjectInvitation {
    pub fn new(project_id: Uuid, invited_by_id: Uuid, invited_user_id: Uuid) -> Self {
        Self {
            id: None,
            project_id,
            invited_by_id,
            invited_user_id,
            status: None,
        }
    }
}

impl CreateInput for CreateProjectInvitation {
    fn validate_input(&self) -> crate::error::DbResult<()> {
        if self.invited_by_id == self.invited_user_id {
            return Err(crate::error::DbError::Validation(
                "A user cannot invite themselves".to_string(),
            ));
        }
        Ok(())
    }

    fn into_values(self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", self.id.unwrap_or_else(Uuid::new_v4).into_value()),
            ("project_id", self.project_id.into_value()),
            ("invited_by_id", self.invited_by_id.into_value()),
            ("invited_user_id", self.invited_user_id.into_value()),
            ("status", or_default(self.status)),
            ("created_at", or_default(None::<DateTime<Utc>>)),
            ("updated_at", or_default(None::<DateTime<Utc>>)),
        ]
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProjectInvitation {
    pub status: Option<InvitationStatus>,
}

impl UpdateProjectInvitation {
    pub fn status(status: InvitationStatus) -> Self {
        Self {
            status: Some(status),
        }
    }
}

impl UpdateInput for UpdateProjectInvitation {
    fn into_assignments(self) -> Vec<(&'static str, Value)> {
        let mut out = Vec::new();
        assign(&mut out, "status", self.status);
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProjectInvitationUnique {
    Id(Uuid),
    ProjectInvitedUser {
        project_id: Uuid,
        invited_user_id: Uuid,
    },
}

impl UniqueKey for ProjectInvitationUnique {
    fn columns(&self) -> Vec<(&'static str, Value)> {
        match self {
            ProjectInvitationUnique::Id(id) => vec![("id", (*id).into_value())],
            ProjectInvitationUnique::ProjectInvitedUser {
                project_id,
                invited_user_id,
            } => vec![
                ("project_id", (*project_id).into_value()),
                ("invited_user_id", (*invited_user_id).into_value()),
            ],
        }
    }
}

impl Model for ProjectInvitation {
    const NAME: &'static str = "ProjectInvitation";
    const TABLE: &'static str = "project_invitations";
    const PRIMARY_KEY: &'static [&'static str] = &["id"];
    const UPDATED_AT: Option<&'static str> = Some("updated_at");

    type Unique = ProjectInvitationUnique;
    type Create = CreateProjectInvitation;
    type Update = UpdateProjectInvitation;
}

pub mod fields {
    use super::*;

    pub const ID: Field<ProjectInvitation, Uuid> = Field::new("id");
    pub const PROJECT_ID: Field<ProjectInvitation, Uuid> = Field::new("project_id");
    pub const INVITED_BY_ID: Field<ProjectInvitation, Uuid> = Field::new("invited_by_id");
    pub const INVITED_USER_ID: Field<ProjectInvitation, Uuid> = Field::new("invited_user_id");
    pub const STATUS: Field<ProjectInvitation, InvitationStatus> = Field::new("status");
    pub const CREATED_AT: Field<ProjectInvitation, DateTime<Utc>> = Field::new("created_at");
    pub const UPDATED_AT: Field<ProjectInvitation, DateTime<Utc>> = Field::new("updated_at");
}

pub mod relations {
    use super::ProjectInvitation;
    use crate::models::project::Project;
    use crate::models::user::User;
    use crate::query::Relation;

    pub const PROJECT: Relation<ProjectInvitation, Project> = Relation::new("project_id", "id");
    pub const INVITED_BY: Relation<ProjectInvitation, User> =
        Relation::new("invited_by_id", "id");
    pub const INVITED_USER: Relation<ProjectInvitation, User> =
        Relation::new("invited_user_id", "id");
}
