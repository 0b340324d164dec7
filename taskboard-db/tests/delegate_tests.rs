/// Integration tests for per-model delegate operations
///
/// Run with: cargo test --test delegate_tests

mod common;

use chrono::Duration;
use common::{create_project, create_user, test_client, unique_email};
use taskboard_db::error::DbError;
use taskboard_db::models::account::{self, AccountUnique, CreateAccount, UpdateAccount};
use taskboard_db::models::post::{self, CreatePost, PostUnique, UpdatePost};
use taskboard_db::models::project::{self, ProjectUnique};
use taskboard_db::models::project_invitation::{
    CreateProjectInvitation, InvitationStatus, ProjectInvitationUnique, UpdateProjectInvitation,
};
use taskboard_db::models::project_member::{
    self, CreateProjectMember, ProjectMemberUnique, ProjectRole,
};
use taskboard_db::models::session::{CreateSession, SessionUnique, UpdateSession};
use taskboard_db::models::task::{self, CreateTask, TaskStatus, TaskUnique, UpdateTask};
use taskboard_db::models::user::{self, CreateUser, UpdateUser, UserUnique};
use taskboard_db::models::verification_token::{CreateVerificationToken, VerificationTokenUnique};
use taskboard_db::query::{Filter, FindArgs, RawQuery};
use uuid::Uuid;

#[tokio::test]
async fn test_user_create_and_find_unique() {
    let Some(client) = test_client().await else { return };

    let email = unique_email();
    let created = client
        .user()
        .create(CreateUser::with_password(email.clone(), "hunter2hunter2").unwrap())
        .await
        .expect("Failed to create user");

    assert_eq!(created.email.as_deref(), Some(email.as_str()));
    assert!(created.verify_password("hunter2hunter2").unwrap());
    assert!(!created.verify_password("wrong").unwrap());

    let by_email = client
        .user()
        .find_unique(UserUnique::Email(email))
        .await
        .unwrap()
        .expect("User should be found by email");
    assert_eq!(by_email.id, created.id);

    let missing = client
        .user()
        .find_unique(UserUnique::Id(Uuid::new_v4()))
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_or_throw_variants_report_not_found() {
    let Some(client) = test_client().await else { return };

    let err = client
        .user()
        .find_unique_or_throw(UserUnique::Id(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let err = client
        .task()
        .find_first_or_throw(task::fields::TITLE.equals(format!("missing {}", Uuid::new_v4())))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NotFound { model: "Task", .. }));
}

#[tokio::test]
async fn test_duplicate_email_is_unique_violation() {
    let Some(client) = test_client().await else { return };

    let email = unique_email();
    let input = CreateUser {
        email: Some(email.clone()),
        ..Default::default()
    };
    client.user().create(input.clone()).await.unwrap();

    let err = client.user().create(input).await.unwrap_err();
    assert!(err.is_unique_violation(), "unexpected error: {:?}", err);
}

#[tokio::test]
async fn test_invalid_create_input_is_rejected_before_sql() {
    let Some(client) = test_client().await else { return };

    let err = client
        .user()
        .create(CreateUser {
            email: Some("not-an-email".to_string()),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Validation(_)));
}

#[tokio::test]
async fn test_missing_parent_is_foreign_key_violation() {
    let Some(client) = test_client().await else { return };

    let err = client
        .post()
        .create(CreatePost::new("Orphan", Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::ForeignKeyViolation { model: "Post", .. }));
}

#[tokio::test]
async fn test_update_sets_fields_and_touches_updated_at() {
    let Some(client) = test_client().await else { return };

    let user = create_user(&client).await;
    let updated = client
        .user()
        .update(
            UserUnique::Id(user.id),
            UpdateUser {
                name: Some(Some("Renamed".to_string())),
                image: Some(Some("https://example.com/a.png".to_string())),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name.as_deref(), Some("Renamed"));
    assert_eq!(updated.email, user.email);
    assert!(updated.updated_at >= user.updated_at);

    let cleared = client
        .user()
        .update(
            UserUnique::Id(user.id),
            UpdateUser {
                image: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(cleared.image.is_none());
    assert_eq!(cleared.name.as_deref(), Some("Renamed"));
}

#[tokio::test]
async fn test_update_missing_row_is_not_found() {
    let Some(client) = test_client().await else { return };

    let err = client
        .post()
        .update(PostUnique::Id(Uuid::new_v4()), UpdatePost::default())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_task_defaults_and_status_change() {
    let Some(client) = test_client().await else { return };

    let user = create_user(&client).await;
    let created = client
        .task()
        .create(CreateTask::new("Write tests", user.id))
        .await
        .unwrap();
    assert_eq!(created.status, TaskStatus::Created);
    assert!(created.finished_at.is_none());
    assert!(created.assigned_to_id.is_none());

    let finished = client
        .task()
        .update(
            TaskUnique::Id(created.id),
            UpdateTask::status_change(TaskStatus::Finished),
        )
        .await
        .unwrap();
    assert_eq!(finished.status, TaskStatus::Finished);
    assert!(finished.finished_at.is_some());

    let reopened = client
        .task()
        .update(
            TaskUnique::Id(created.id),
            UpdateTask::status_change(TaskStatus::InProgress),
        )
        .await
        .unwrap();
    assert_eq!(reopened.status, TaskStatus::InProgress);
    assert!(reopened.finished_at.is_none());
}

#[tokio::test]
async fn test_find_many_filters_order_and_pagination() {
    let Some(client) = test_client().await else { return };

    let user = create_user(&client).await;
    let titles = ["alpha", "bravo", "charlie", "delta", "echo"];
    for title in titles {
        client
            .task()
            .create(CreateTask::new(title, user.id))
            .await
            .unwrap();
    }
    let mine = task::fields::CREATED_BY_ID.equals(user.id);

    let page = client
        .task()
        .find_many(
            FindArgs::new()
                .filter(mine.clone())
                .order_by(task::fields::TITLE.asc())
                .skip(1)
                .take(2),
        )
        .await
        .unwrap();
    let page: Vec<_> = page.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(page, vec!["bravo", "charlie"]);

    // Negative take: the last two, still in ascending order
    let last = client
        .task()
        .find_many(
            FindArgs::new()
                .filter(mine.clone())
                .order_by(task::fields::TITLE.asc())
                .take(-2),
        )
        .await
        .unwrap();
    let last: Vec<_> = last.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(last, vec!["delta", "echo"]);

    let first = client
        .task()
        .find_first(
            FindArgs::new()
                .filter(mine.clone())
                .order_by(task::fields::TITLE.desc()),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.title, "echo");

    let matching = client
        .task()
        .find_many(Filter::and([
            mine.clone(),
            Filter::or([
                task::fields::TITLE.starts_with("al"),
                task::fields::TITLE.ends_with_insensitive("HO"),
            ]),
        ]))
        .await
        .unwrap();
    assert_eq!(matching.len(), 2);

    let none = client
        .task()
        .find_many(Filter::and([mine.clone(), task::fields::TITLE.in_(Vec::<String>::new())]))
        .await
        .unwrap();
    assert!(none.is_empty());

    let count = client
        .task()
        .count(FindArgs::new().filter(mine).take(3))
        .await
        .unwrap();
    assert_eq!(count, 3);
}

#[tokio::test]
async fn test_like_wildcards_are_literal() {
    let Some(client) = test_client().await else { return };

    let user = create_user(&client).await;
    let tag = Uuid::new_v4().to_string();
    client
        .task()
        .create(CreateTask::new(format!("100% done {}", tag), user.id))
        .await
        .unwrap();
    client
        .task()
        .create(CreateTask::new(format!("1000 done {}", tag), user.id))
        .await
        .unwrap();

    let matches = client
        .task()
        .find_many(Filter::and([
            task::fields::TITLE.contains(&tag),
            task::fields::TITLE.contains("0%"),
        ]))
        .await
        .unwrap();
    assert_eq!(matches.len(), 1);
}

#[tokio::test]
async fn test_nullable_filters() {
    let Some(client) = test_client().await else { return };

    let owner = create_user(&client).await;
    let assignee = create_user(&client).await;
    client
        .task()
        .create(CreateTask::new("unassigned", owner.id))
        .await
        .unwrap();
    client
        .task()
        .create(CreateTask::new("assigned", owner.id).assigned_to(assignee.id))
        .await
        .unwrap();

    let mine = task::fields::CREATED_BY_ID.equals(owner.id);
    let unassigned = client
        .task()
        .find_many(mine.clone().with(task::fields::ASSIGNED_TO_ID.equals(None)))
        .await
        .unwrap();
    assert_eq!(unassigned.len(), 1);
    assert_eq!(unassigned[0].title, "unassigned");

    let assigned = client
        .task()
        .find_many(mine.with(task::fields::ASSIGNED_TO_ID.is_not_null()))
        .await
        .unwrap();
    assert_eq!(assigned.len(), 1);
    assert_eq!(assigned[0].assigned_to_id, Some(assignee.id));
}

#[tokio::test]
async fn test_relation_filters() {
    let Some(client) = test_client().await else { return };

    let owner = create_user(&client).await;
    let member = create_user(&client).await;
    let outsider = create_user(&client).await;
    let project = create_project(&client, &owner).await;

    client
        .project_member()
        .create(CreateProjectMember::new(project.id, member.id, ProjectRole::Member))
        .await
        .unwrap();
    client
        .task()
        .create(CreateTask::new("in project", owner.id).in_project(project.id))
        .await
        .unwrap();

    // Users with a membership in the project
    let members = client
        .user()
        .find_many(user::relations::MEMBERSHIPS.some(
            project_member::fields::PROJECT_ID.equals(project.id),
        ))
        .await
        .unwrap();
    let ids: Vec<_> = members.iter().map(|u| u.id).collect();
    assert_eq!(ids, vec![member.id]);

    // Outsider has no memberships at all
    let without = client
        .user()
        .find_many(Filter::and([
            user::fields::ID.in_([owner.id, member.id, outsider.id]),
            user::relations::MEMBERSHIPS.none(Filter::all()),
        ]))
        .await
        .unwrap();
    let ids: Vec<_> = without.iter().map(|u| u.id).collect();
    assert!(ids.contains(&owner.id));
    assert!(ids.contains(&outsider.id));
    assert!(!ids.contains(&member.id));

    // To-one relation through the task's project
    let tasks = client
        .task()
        .find_many(task::relations::PROJECT.is(project::fields::OWNER_ID.equals(owner.id)))
        .await
        .unwrap();
    assert_eq!(tasks.len(), 1);

    // Every task of the owner is unfinished
    let all_open = client
        .user()
        .find_many(Filter::and([
            user::fields::ID.equals(owner.id),
            user::relations::CREATED_TASKS.every(task::fields::STATUS.not(TaskStatus::Finished)),
        ]))
        .await
        .unwrap();
    assert_eq!(all_open.len(), 1);
}

#[tokio::test]
async fn test_create_many_and_skip_duplicates() {
    let Some(client) = test_client().await else { return };

    let owner = create_user(&client).await;
    let a = create_user(&client).await;
    let b = create_user(&client).await;
    let project = create_project(&client, &owner).await;

    assert_eq!(client.project_member().create_many(Vec::new(), false).await.unwrap(), 0);

    let inputs = vec![
        CreateProjectMember::new(project.id, owner.id, ProjectRole::Owner),
        CreateProjectMember {
            id: None,
            project_id: project.id,
            user_id: a.id,
            role: None,
        },
    ];
    let inserted = client
        .project_member()
        .create_many_and_return(inputs, false)
        .await
        .unwrap();
    assert_eq!(inserted.len(), 2);
    let defaulted = inserted.iter().find(|m| m.user_id == a.id).unwrap();
    assert_eq!(defaulted.role, ProjectRole::Member);

    let again = vec![
        CreateProjectMember::new(project.id, a.id, ProjectRole::Member),
        CreateProjectMember::new(project.id, b.id, ProjectRole::Member),
    ];
    let err = client
        .project_member()
        .create_many(again.clone(), false)
        .await
        .unwrap_err();
    assert!(err.is_unique_violation());

    let count = client.project_member().create_many(again, true).await.unwrap();
    assert_eq!(count, 1);

    let found = client
        .project_member()
        .find_unique(ProjectMemberUnique::ProjectUser {
            project_id: project.id,
            user_id: b.id,
        })
        .await
        .unwrap();
    assert!(found.is_some());
}

#[tokio::test]
async fn test_update_many_and_delete_many() {
    let Some(client) = test_client().await else { return };

    let user = create_user(&client).await;
    for i in 0..3 {
        client
            .post()
            .create(CreatePost::new(format!("draft {}", i), user.id))
            .await
            .unwrap();
    }
    let mine = post::fields::CREATED_BY_ID.equals(user.id);

    let renamed = client
        .post()
        .update_many_and_return(
            mine.clone().with(post::fields::NAME.ends_with("0")),
            UpdatePost {
                name: Some("published".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.len(), 1);
    assert_eq!(renamed[0].name, "published");

    let updated = client
        .post()
        .update_many(
            mine.clone().with(post::fields::NAME.starts_with("draft")),
            UpdatePost {
                name: Some("archived".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated, 2);

    let deleted = client
        .post()
        .delete_many(mine.clone().with(post::fields::NAME.equals("archived".to_string())))
        .await
        .unwrap();
    assert_eq!(deleted, 2);

    assert_eq!(client.post().count(mine).await.unwrap(), 1);
}

#[tokio::test]
async fn test_upsert_inserts_then_updates() {
    let Some(client) = test_client().await else { return };

    let user = create_user(&client).await;
    let provider_account_id = Uuid::new_v4().to_string();
    let key = AccountUnique::ProviderAccount {
        provider: "github".to_string(),
        provider_account_id: provider_account_id.clone(),
    };
    let create = CreateAccount {
        user_id: user.id,
        kind: "oauth".to_string(),
        provider: "github".to_string(),
        provider_account_id: provider_account_id.clone(),
        access_token: Some("first".to_string()),
        ..Default::default()
    };
    let update = UpdateAccount {
        access_token: Some(Some("second".to_string())),
        ..Default::default()
    };

    let inserted = client
        .account()
        .upsert(key.clone(), create.clone(), update.clone())
        .await
        .unwrap();
    assert_eq!(inserted.access_token.as_deref(), Some("first"));

    let updated = client.account().upsert(key, create, update).await.unwrap();
    assert_eq!(updated.id, inserted.id);
    assert_eq!(updated.access_token.as_deref(), Some("second"));

    let count = client
        .account()
        .count(account::fields::PROVIDER_ACCOUNT_ID.equals(provider_account_id))
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_delete_returns_row_and_cascades() {
    let Some(client) = test_client().await else { return };

    let owner = create_user(&client).await;
    let invitee = create_user(&client).await;
    let project = create_project(&client, &owner).await;
    let task = client
        .task()
        .create(CreateTask::new("survives", owner.id).in_project(project.id))
        .await
        .unwrap();
    let invitation = client
        .project_invitation()
        .create(CreateProjectInvitation::new(project.id, owner.id, invitee.id))
        .await
        .unwrap();
    assert_eq!(invitation.status, InvitationStatus::Pending);

    let accepted = client
        .project_invitation()
        .update(
            ProjectInvitationUnique::ProjectInvitedUser {
                project_id: project.id,
                invited_user_id: invitee.id,
            },
            UpdateProjectInvitation::status(InvitationStatus::Accepted),
        )
        .await
        .unwrap();
    assert!(accepted.status.is_resolved());

    let deleted = client
        .project()
        .delete(ProjectUnique::Id(project.id))
        .await
        .unwrap();
    assert_eq!(deleted.id, project.id);

    // Invitations cascade, tasks keep living without a project
    let invitation = client
        .project_invitation()
        .find_unique(ProjectInvitationUnique::Id(invitation.id))
        .await
        .unwrap();
    assert!(invitation.is_none());

    let task = client
        .task()
        .find_unique_or_throw(TaskUnique::Id(task.id))
        .await
        .unwrap();
    assert!(task.project_id.is_none());

    let err = client
        .project()
        .delete(ProjectUnique::Id(project.id))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_sessions_and_verification_tokens() {
    let Some(client) = test_client().await else { return };

    let user = create_user(&client).await;
    let session = client
        .session()
        .create(CreateSession::new(user.id, Duration::hours(1)))
        .await
        .unwrap();
    assert!(!session.is_expired());

    let expired = client
        .session()
        .update(
            SessionUnique::SessionToken(session.session_token.clone()),
            UpdateSession {
                expires: Some(chrono::Utc::now() - Duration::minutes(1)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(expired.is_expired());

    let identifier = unique_email();
    let token = client
        .verification_token()
        .create(CreateVerificationToken::new(identifier.clone(), Duration::minutes(15)))
        .await
        .unwrap();

    let consumed = client
        .verification_token()
        .delete(VerificationTokenUnique::IdentifierToken {
            identifier,
            token: token.token.clone(),
        })
        .await
        .unwrap();
    assert!(!consumed.is_expired());

    let gone = client
        .verification_token()
        .find_unique(VerificationTokenUnique::Token(token.token))
        .await
        .unwrap();
    assert!(gone.is_none());
}

fn titled_task(title: &str, created_by_id: Uuid, status: TaskStatus) -> CreateTask {
    let mut input = CreateTask::new(title, created_by_id);
    input.status = Some(status);
    input
}

#[tokio::test]
async fn test_every_fails_on_null_columns() {
    let Some(client) = test_client().await else { return };

    let owner = create_user(&client).await;
    let with_null = create_project(&client, &owner).await;
    let with_match = create_project(&client, &owner).await;
    let empty = create_project(&client, &owner).await;

    client
        .task()
        .create(CreateTask::new("no description", owner.id).in_project(with_null.id))
        .await
        .unwrap();
    let mut described = CreateTask::new("described", owner.id).in_project(with_match.id);
    described.description = Some("x".to_string());
    client.task().create(described).await.unwrap();

    let projects = client
        .project()
        .find_many(
            FindArgs::new()
                .filter(project::fields::OWNER_ID.equals(owner.id))
                .filter(project::relations::TASKS.every(
                    task::fields::DESCRIPTION.equals(Some("x".to_string())),
                ))
                .order_by(project::fields::NAME.asc()),
        )
        .await
        .unwrap();

    let ids: Vec<_> = projects.iter().map(|p| p.id).collect();
    assert!(!ids.contains(&with_null.id), "NULL description must not satisfy every()");
    assert!(ids.contains(&with_match.id));
    assert!(ids.contains(&empty.id), "every() holds for a project without tasks");
}

#[tokio::test]
async fn test_relation_is_not() {
    let Some(client) = test_client().await else { return };

    let owner = create_user(&client).await;
    let other = create_user(&client).await;
    let mine = create_project(&client, &owner).await;
    let theirs = create_project(&client, &other).await;

    for (title, project_id) in [("mine", Some(mine.id)), ("theirs", Some(theirs.id)), ("loose", None)] {
        let mut input = CreateTask::new(title, owner.id);
        input.project_id = project_id;
        client.task().create(input).await.unwrap();
    }

    let tasks = client
        .task()
        .find_many(
            FindArgs::new()
                .filter(task::fields::CREATED_BY_ID.equals(owner.id))
                .filter(task::relations::PROJECT.is_not(project::fields::OWNER_ID.equals(owner.id)))
                .order_by(task::fields::TITLE.asc()),
        )
        .await
        .unwrap();

    let titles: Vec<_> = tasks.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["loose", "theirs"]);
}

#[tokio::test]
async fn test_nulls_placement_in_order() {
    let Some(client) = test_client().await else { return };

    let user = create_user(&client).await;
    for (title, description) in [("a", Some("beta")), ("b", None), ("c", Some("alpha"))] {
        let mut input = CreateTask::new(title, user.id);
        input.description = description.map(str::to_string);
        client.task().create(input).await.unwrap();
    }
    let mine = task::fields::CREATED_BY_ID.equals(user.id);

    let first = client
        .task()
        .find_many(
            FindArgs::new()
                .filter(mine.clone())
                .order_by(task::fields::DESCRIPTION.asc().nulls_first()),
        )
        .await
        .unwrap();
    let titles: Vec<_> = first.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["b", "c", "a"]);

    let last = client
        .task()
        .find_many(
            FindArgs::new()
                .filter(mine.clone())
                .order_by(task::fields::DESCRIPTION.desc().nulls_last()),
        )
        .await
        .unwrap();
    let titles: Vec<_> = last.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["a", "c", "b"]);

    // Reading from the end keeps the NULL placement of the requested order
    let tail = client
        .task()
        .find_many(
            FindArgs::new()
                .filter(mine)
                .order_by(task::fields::DESCRIPTION.asc().nulls_first())
                .take(-2),
        )
        .await
        .unwrap();
    let titles: Vec<_> = tail.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["c", "a"]);
}

#[tokio::test]
async fn test_distinct_keeps_first_row_per_value() {
    let Some(client) = test_client().await else { return };

    let user = create_user(&client).await;
    client
        .task()
        .create_many(
            vec![
                titled_task("a1", user.id, TaskStatus::Created),
                titled_task("a2", user.id, TaskStatus::Created),
                titled_task("b1", user.id, TaskStatus::InProgress),
                titled_task("b2", user.id, TaskStatus::InProgress),
                titled_task("c1", user.id, TaskStatus::Finished),
            ],
            false,
        )
        .await
        .unwrap();

    let args = FindArgs::new()
        .filter(task::fields::CREATED_BY_ID.equals(user.id))
        .order_by(task::fields::TITLE.asc())
        .distinct(task::fields::STATUS);

    let firsts = client.task().find_many(args.clone()).await.unwrap();
    let titles: Vec<_> = firsts.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["a1", "b1", "c1"]);

    assert_eq!(client.task().count(args.clone()).await.unwrap(), 3);

    // The last two of the distinct rows, not the last row per status
    let tail = client.task().find_many(args.clone().take(-2)).await.unwrap();
    let titles: Vec<_> = tail.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["b1", "c1"]);

    let last = client.task().find_first(args.take(-1)).await.unwrap().unwrap();
    assert_eq!(last.title, "c1");
}

#[tokio::test]
async fn test_null_in_required_column_is_null_violation() {
    let Some(client) = test_client().await else { return };

    let user = create_user(&client).await;
    let err = client
        .execute_raw(
            RawQuery::new("INSERT INTO posts (id, name, created_by_id) VALUES ($1, $2, $3)")
                .bind(Uuid::new_v4())
                .bind(None::<String>)
                .bind(user.id),
        )
        .await
        .unwrap_err();

    match err {
        DbError::NullViolation { column, .. } => assert_eq!(column, "name"),
        other => panic!("expected NullViolation, got {other:?}"),
    }
}

#[tokio::test]
async fn test_issued_verification_token_is_stored_as_digest() {
    let Some(client) = test_client().await else { return };

    let identifier = unique_email();
    let (input, plaintext) = CreateVerificationToken::issue(identifier.clone(), Duration::hours(1));
    let stored = client.verification_token().create(input).await.unwrap();
    assert_ne!(stored.token, plaintext);
    assert!(stored.matches(&plaintext));

    let by_plaintext = client
        .verification_token()
        .find_unique(VerificationTokenUnique::Token(plaintext.clone()))
        .await
        .unwrap();
    assert!(by_plaintext.is_none(), "plaintext must not be stored");

    let consumed = client
        .verification_token()
        .delete(VerificationTokenUnique::from_plaintext(identifier, &plaintext))
        .await
        .unwrap();
    assert_eq!(consumed.token, stored.token);
}
