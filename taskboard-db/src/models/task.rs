/// Task model
///
/// Tasks are created by a user, can be assigned to another user and can
/// belong to a project. Deleting the assignee or the project keeps the task
/// and clears the reference.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('CREATED', 'IN_PROGRESS', 'FINISHED');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY,
///     title TEXT NOT NULL,
///     description TEXT,
///     status task_status NOT NULL DEFAULT 'CREATED',
///     created_by_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     assigned_to_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     project_id UUID REFERENCES projects(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     finished_at TIMESTAMPTZ
/// );
/// ```
///
/// # State Machine
///
/// ```text
/// CREATED → IN_PROGRESS → FINISHED
///    ↓                       ↓
/// FINISHED              IN_PROGRESS (reopened)
/// ```
///
/// # Example
///
/// ```no_run
/// use taskboard_db::client::Client;
/// use taskboard_db::models::task::{fields, CreateTask, TaskStatus, TaskUnique, UpdateTask};
/// use taskboard_db::query::FindArgs;
/// use uuid::Uuid;
///
/// # async fn example(client: Client, user_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let task = client
///     .task()
///     .create(CreateTask::new("Write release notes", user_id))
///     .await?;
///
/// client
///     .task()
///     .update(TaskUnique::Id(task.id), UpdateTask::status_change(TaskStatus::Finished))
///     .await?;
///
/// let open = client
///     .task()
///     .count(FindArgs::new().filter(fields::STATUS.not(TaskStatus::Finished)))
///     .await?;
/// # Ok(())
/// # }
/// ```

use super::{assign, or_default, CreateInput, Model, UniqueKey, UpdateInput};
use crate::error::DbResult;
use crate::query::{DbEnum, Field, IntoValue, Value};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Task progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Not started yet
    Created,

    /// Being worked on
    InProgress,

    /// Done
    Finished,
}

impl TaskStatus {
    /// Converts status to its database label
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Created => "CREATED",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Finished => "FINISHED",
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, TaskStatus::Finished)
    }

    /// Checks if transition to target status is valid
    pub fn can_transition_to(&self, target: TaskStatus) -> bool {
        match (self, target) {
            (TaskStatus::Created, TaskStatus::InProgress) => true,
            (TaskStatus::Created, TaskStatus::Finished) => true,
            (TaskStatus::InProgress, TaskStatus::Finished) => true,

            // Reopening a finished task
            (TaskStatus::Finished, TaskStatus::InProgress) => true,

            _ => false,
        }
    }
}

impl DbEnum for TaskStatus {
    const TYPE_NAME: &'static str = "task_status";

    fn label(&self) -> &'static str {
        self.as_str()
    }
}

crate::impl_db_enum_value!(TaskStatus);

/// A task
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub created_by_id: Uuid,
    pub assigned_to_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Set when the task reaches FINISHED, cleared when it is reopened
    pub finished_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Time from creation to completion
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|finished| finished - self.created_at)
    }
}

/// Input for creating a task
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTask {
    pub id: Option<Uuid>,

    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,

    /// Defaults to `Created`
    pub status: Option<TaskStatus>,

    pub created_by_id: Uuid,
    pub assigned_to_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
}

impl CreateTask {
    pub fn new(title: impl Into<String>, created_by_id: Uuid) -> Self {
        Self {
            id: None,
            title: title.into(),
            description: None,
            status: None,
            created_by_id,
            assigned_to_id: None,
            project_id: None,
        }
    }

    pub fn in_project(mut self, project_id: Uuid) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn assigned_to(mut self, user_id: Uuid) -> Self {
        self.assigned_to_id = Some(user_id);
        self
    }
}

impl CreateInput for CreateTask {
    fn validate_input(&self) -> DbResult<()> {
        Ok(self.validate()?)
    }

    fn into_values(self) -> Vec<(&'static str, Value)> {
        let finished_at = match self.status {
            Some(TaskStatus::Finished) => Some(Utc::now()),
            _ => None,
        };

        vec![
            ("id", self.id.unwrap_or_else(Uuid::new_v4).into_value()),
            ("title", self.title.into_value()),
            ("description", self.description.into_value()),
            ("status", or_default(self.status)),
            ("created_by_id", self.created_by_id.into_value()),
            ("assigned_to_id", self.assigned_to_id.into_value()),
            ("project_id", self.project_id.into_value()),
            ("created_at", or_default(None::<DateTime<Utc>>)),
            ("updated_at", or_default(None::<DateTime<Utc>>)),
            ("finished_at", finished_at.into_value()),
        ]
    }
}

/// Input for updating a task
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub assigned_to_id: Option<Option<Uuid>>,
    pub project_id: Option<Option<Uuid>>,
    pub finished_at: Option<Option<DateTime<Utc>>>,
}

impl UpdateTask {
    /// Moves the task to `status`, stamping or clearing `finished_at`
    pub fn status_change(status: TaskStatus) -> Self {
        let finished_at = if status.is_finished() {
            Some(Utc::now())
        } else {
            None
        };

        Self {
            status: Some(status),
            finished_at: Some(finished_at),
            ..Default::default()
        }
    }
}

impl UpdateInput for UpdateTask {
    fn into_assignments(self) -> Vec<(&'static str, Value)> {
        let mut out = Vec::new();
        assign(&mut out, "title", self.title);
        assign(&mut out, "description", self.description);
        assign(&mut out, "status", self.status);
        assign(&mut out, "assigned_to_id", self.assigned_to_id);
        assign(&mut out, "project_id", self.project_id);
        assign(&mut out, "finished_at", self.finished_at);
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskUnique {
    Id(Uuid),
}

impl UniqueKey for TaskUnique {
    fn columns(&self) -> Vec<(&'static str, Value)> {
        match self {
            TaskUnique::Id(id) => vec![("id", (*id).into_value())],
        }
    }
}

impl Model for Task {
    const NAME: &'static str = "Task";
    const TABLE: &'static str = "tasks";
    const PRIMARY_KEY: &'static [&'static str] = &["id"];
    const UPDATED_AT: Option<&'static str> = Some("updated_at");

    type Unique = TaskUnique;
    type Create = CreateTask;
    type Update = UpdateTask;
}

/// Column handles
pub mod fields {
    use super::*;

    pub const ID: Field<Task, Uuid> = Field::new("id");
    pub const TITLE: Field<Task, String> = Field::new("title");
    pub const DESCRIPTION: Field<Task, Option<String>> = Field::new("description");
    pub const STATUS: Field<Task, TaskStatus> = Field::new("status");
    pub const CREATED_BY_ID: Field<Task, Uuid> = Field::new("created_by_id");
    pub const ASSIGNED_TO_ID: Field<Task, Option<Uuid>> = Field::new("assigned_to_id");
    pub const PROJECT_ID: Field<Task, Option<Uuid>> = Field::new("project_id");
    pub const CREATED_AT: Field<Task, DateTime<Utc>> = Field::new("created_at");
    pub const UPDATED_AT: Field<Task, DateTime<Utc>> = Field::new("updated_at");
    pub const FINISHED_AT: Field<Task, Option<DateTime<Utc>>> = Field::new("finished_at");
}

/// Relation handles
pub mod relations {
    use super::Task;
    use crate::models::project::Project;
    use crate::models::user::User;
    use crate::query::Relation;

    pub const CREATOR: Relation<Task, User> = Relation::new("created_by_id", "id");
    pub const ASSIGNEE: Relation<Task, User> = Relation::new("assigned_to_id", "id");
    pub const PROJECT: Relation<Task, Project> = Relation::new("project_id", "id");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        assert!(TaskStatus::Created.can_transition_to(TaskStatus::InProgress));
        assert!(TaskStatus::Created.can_transition_to(TaskStatus::Finished));
        assert!(TaskStatus::InProgress.can_transition_to(TaskStatus::Finished));
        assert!(TaskStatus::Finished.can_transition_to(TaskStatus::InProgress));

        assert!(!TaskStatus::Finished.can_transition_to(TaskStatus::Created));
        assert!(!TaskStatus::InProgress.can_transition_to(TaskStatus::Created));
        assert!(!TaskStatus::Created.can_transition_to(TaskStatus::Created));
    }

    #[test]
    fn test_status_labels_match_serde() {
        for status in [TaskStatus::Created, TaskStatus::InProgress, TaskStatus::Finished] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn test_status_change_stamps_finished_at() {
        let update = UpdateTask::status_change(TaskStatus::Finished);
        assert!(matches!(update.finished_at, Some(Some(_))));

        let update = UpdateTask::status_change(TaskStatus::InProgress);
        assert_eq!(update.finished_at, Some(None));

        let assignments = update.into_assignments();
        assert_eq!(assignments[1], ("finished_at", Value::Timestamp(None)));
    }

    #[test]
    fn test_create_task_defaults() {
        let values = CreateTask::new("Ship it", Uuid::new_v4()).into_values();
        assert_eq!(values[3], ("status", Value::Default));
        assert_eq!(values[6], ("project_id", Value::Uuid(None)));
        assert_eq!(values[9], ("finished_at", Value::Timestamp(None)));
    }

    #[test]
    fn test_create_finished_task_sets_finished_at() {
        let mut input = CreateTask::new("Done already", Uuid::new_v4());
        input.status = Some(TaskStatus::Finished);
        let values = input.into_values();
        assert!(matches!(values[9], ("finished_at", Value::Timestamp(Some(_)))));
    }

    #[test]
    fn test_blank_title_rejected() {
        assert!(CreateTask::new("", Uuid::new_v4()).validate_input().is_err());
    }
}
