use chrono::{Duration, Utc};
use db::{
    DBService,
    models::{
        comment::{Comment, CommentFilter, CreateComment},
        document::{CreateDocument, Document, DocumentFilter},
        document_version::{CreateDocumentVersion, DocumentVersion},
        favorite::{CreateFavorite, Favorite, FavoriteError},
        project::{CreateProject, Project},
        subtask::{CreateSubtask, Subtask, SubtaskFilter},
        task::{CreateTask, Task, TaskFilter},
        task_detail::{TaskDetail, UpsertTaskDetail},
        template::{CreateTemplate, Template},
        topic::{CreateTopic, Topic},
    },
    types::TaskStatus,
};
use uuid::Uuid;

async fn setup() -> DBService {
    DBService::new_in_memory().await.unwrap()
}

async fn make_topic(db: &DBService, name: &str) -> Topic {
    Topic::create(
        &db.conn,
        &CreateTopic {
            name: name.to_string(),
            description: None,
        },
        Uuid::new_v4(),
    )
    .await
    .unwrap()
}

async fn make_project(db: &DBService, topic: &Topic, name: &str) -> Project {
    Project::create(
        &db.conn,
        &CreateProject {
            topic_id: topic.id,
            name: name.to_string(),
            description: None,
        },
        Uuid::new_v4(),
    )
    .await
    .unwrap()
}

async fn make_task(db: &DBService, project: &Project, title: &str, status: TaskStatus) -> Task {
    Task::create(
        &db.conn,
        &CreateTask {
            project_id: project.id,
            title: title.to_string(),
            description: None,
            status: Some(status),
            assignee_user_id: None,
        },
        Uuid::new_v4(),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn topic_without_projects_has_zero_active_count() {
    let db = setup().await;
    let topic = make_topic(&db, "empty").await;

    let count = Topic::active_projects_count(&db.conn, topic.id).await.unwrap();
    assert_eq!(count, 0);

    let stats = Topic::find_by_id_with_stats(&db.conn, topic.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stats.total_projects, 0);
    assert_eq!(stats.active_projects, 0);
    assert_eq!(stats.completed_projects, 0);
}

#[tokio::test]
async fn active_project_count_is_distinct_over_tasks() {
    let db = setup().await;
    let topic = make_topic(&db, "t").await;
    let project = make_project(&db, &topic, "p").await;

    // several active tasks in one project still count the project once
    make_task(&db, &project, "a", TaskStatus::New).await;
    make_task(&db, &project, "b", TaskStatus::InProgress).await;
    make_task(&db, &project, "c", TaskStatus::Done).await;

    let count = Topic::active_projects_count(&db.conn, topic.id).await.unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn active_count_follows_task_status_transitions() {
    let db = setup().await;
    let topic = make_topic(&db, "t").await;
    let project = make_project(&db, &topic, "p").await;
    let task = make_task(&db, &project, "k", TaskStatus::New).await;

    assert_eq!(
        Topic::active_projects_count(&db.conn, topic.id).await.unwrap(),
        1
    );

    Task::update_status(&db.conn, task.id, TaskStatus::Done)
        .await
        .unwrap();
    assert_eq!(
        Topic::active_projects_count(&db.conn, topic.id).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn project_stats_partition_is_consistent() {
    let db = setup().await;
    let topic = make_topic(&db, "t").await;
    let project = make_project(&db, &topic, "p").await;
    make_task(&db, &project, "a", TaskStatus::New).await;
    make_task(&db, &project, "b", TaskStatus::Review).await;
    make_task(&db, &project, "c", TaskStatus::Done).await;

    let stats = Project::find_all_with_stats(&db.conn, Some(topic.id))
        .await
        .unwrap();
    assert_eq!(stats.len(), 1);
    let p = &stats[0];
    assert_eq!(p.total_tasks, 3);
    assert_eq!(p.active_tasks, 1);
    assert_eq!(p.completed_tasks, 1);
    assert!(p.active_tasks + p.completed_tasks <= p.total_tasks);
}

#[tokio::test]
async fn overdue_depends_on_age_and_status() {
    let db = setup().await;
    let topic = make_topic(&db, "t").await;
    let project = make_project(&db, &topic, "p").await;
    let task = make_task(&db, &project, "k", TaskStatus::New).await;

    // fresh task is never overdue
    assert!(!task.is_overdue());

    let now = task.created_at;
    assert!(!task.is_overdue_at(now + Duration::days(7)));
    assert!(task.is_overdue_at(now + Duration::days(7) + Duration::seconds(1)));

    let done = Task::update_status(&db.conn, task.id, TaskStatus::Done)
        .await
        .unwrap();
    assert!(!done.is_overdue_at(now + Duration::days(30)));
}

#[tokio::test]
async fn task_stats_count_children() {
    let db = setup().await;
    let topic = make_topic(&db, "t").await;
    let project = make_project(&db, &topic, "p").await;
    let task = make_task(&db, &project, "k", TaskStatus::New).await;
    let bare = make_task(&db, &project, "bare", TaskStatus::New).await;

    for (title, status) in [("s1", TaskStatus::New), ("s2", TaskStatus::Done)] {
        Subtask::create(
            &db.conn,
            &CreateSubtask {
                task_id: task.id,
                title: title.to_string(),
                description: None,
                status: Some(status),
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();
    }
    Comment::create(
        &db.conn,
        &CreateComment {
            task_id: Some(task.id),
            subtask_id: None,
            content: "note".to_string(),
        },
        Uuid::new_v4(),
        Uuid::new_v4(),
    )
    .await
    .unwrap();

    let stats = Task::find_all_with_stats(&db.conn, &TaskFilter::default())
        .await
        .unwrap();
    let with = stats.iter().find(|t| t.id == task.id).unwrap();
    assert_eq!(with.subtasks_count, 2);
    assert_eq!(with.completed_subtasks_count, 1);
    assert_eq!(with.comments_count, 1);

    let without = stats.iter().find(|t| t.id == bare.id).unwrap();
    assert_eq!(without.subtasks_count, 0);
    assert_eq!(without.comments_count, 0);
}

#[tokio::test]
async fn task_filters_compose() {
    let db = setup().await;
    let topic = make_topic(&db, "t").await;
    let p1 = make_project(&db, &topic, "p1").await;
    let p2 = make_project(&db, &topic, "p2").await;
    make_task(&db, &p1, "a", TaskStatus::New).await;
    make_task(&db, &p1, "b", TaskStatus::Done).await;
    make_task(&db, &p2, "c", TaskStatus::New).await;

    let by_project = Task::find_all(
        &db.conn,
        &TaskFilter {
            project_id: Some(p1.id),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(by_project.len(), 2);

    let active_in_p1 = Task::find_all(
        &db.conn,
        &TaskFilter {
            project_id: Some(p1.id),
            active_only: true,
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(active_in_p1.len(), 1);
    assert_eq!(active_in_p1[0].title, "a");

    let done = Task::find_all(
        &db.conn,
        &TaskFilter {
            status: Some(TaskStatus::Done),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(done.len(), 1);

    // nothing was created more than a week ago
    let overdue = Task::find_all(
        &db.conn,
        &TaskFilter {
            overdue: true,
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert!(overdue.is_empty());
}

#[tokio::test]
async fn unassign_clears_only_the_given_user() {
    let db = setup().await;
    let topic = make_topic(&db, "t").await;
    let project = make_project(&db, &topic, "p").await;
    let user_a = Uuid::new_v4();
    let user_b = Uuid::new_v4();

    for (title, user) in [("a1", user_a), ("a2", user_a), ("b1", user_b)] {
        Task::create(
            &db.conn,
            &CreateTask {
                project_id: project.id,
                title: title.to_string(),
                description: None,
                status: None,
                assignee_user_id: Some(user),
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();
    }

    let touched = Task::unassign_user(&db.conn, user_a).await.unwrap();
    assert_eq!(touched, 2);

    let tasks = Task::find_all(&db.conn, &TaskFilter::default()).await.unwrap();
    let still_assigned: Vec<_> = tasks
        .iter()
        .filter(|t| t.assignee_user_id.is_some())
        .collect();
    assert_eq!(still_assigned.len(), 1);
    assert_eq!(still_assigned[0].assignee_user_id, Some(user_b));
}

#[tokio::test]
async fn topic_deletion_cascades_to_the_whole_subtree() {
    let db = setup().await;
    let topic = make_topic(&db, "t").await;
    let project = make_project(&db, &topic, "p").await;
    let task = make_task(&db, &project, "k", TaskStatus::New).await;

    let subtask = Subtask::create(
        &db.conn,
        &CreateSubtask {
            task_id: task.id,
            title: "s".to_string(),
            description: None,
            status: None,
        },
        Uuid::new_v4(),
    )
    .await
    .unwrap();
    let comment = Comment::create(
        &db.conn,
        &CreateComment {
            task_id: Some(task.id),
            subtask_id: None,
            content: "c".to_string(),
        },
        Uuid::new_v4(),
        Uuid::new_v4(),
    )
    .await
    .unwrap();
    let document = Document::create(
        &db.conn,
        &CreateDocument {
            project_id: Some(project.id),
            task_id: Some(task.id),
            title: "d".to_string(),
            content: None,
        },
        Uuid::new_v4(),
    )
    .await
    .unwrap();
    DocumentVersion::create(
        &db.conn,
        document.id,
        &CreateDocumentVersion {
            content: "v1".to_string(),
        },
        Uuid::new_v4(),
        Uuid::new_v4(),
    )
    .await
    .unwrap();
    let template = Template::create(
        &db.conn,
        &CreateTemplate {
            topic_id: topic.id,
            name: "tmpl".to_string(),
            content: None,
        },
        Uuid::new_v4(),
    )
    .await
    .unwrap();

    Topic::delete(&db.conn, topic.id).await.unwrap();

    assert!(Project::find_by_id(&db.conn, project.id).await.unwrap().is_none());
    assert!(Task::find_by_id(&db.conn, task.id).await.unwrap().is_none());
    assert!(Subtask::find_by_id(&db.conn, subtask.id).await.unwrap().is_none());
    assert!(Comment::find_by_id(&db.conn, comment.id).await.unwrap().is_none());
    assert!(Document::find_by_id(&db.conn, document.id).await.unwrap().is_none());
    assert!(Template::find_by_id(&db.conn, template.id).await.unwrap().is_none());
}

#[tokio::test]
async fn favorite_target_is_exclusive_and_unique() {
    let db = setup().await;
    let topic = make_topic(&db, "t").await;
    let project = make_project(&db, &topic, "p").await;
    let user = Uuid::new_v4();

    let neither = Favorite::create(
        &db.conn,
        user,
        &CreateFavorite {
            project_id: None,
            task_id: None,
        },
        Uuid::new_v4(),
    )
    .await;
    assert!(matches!(neither, Err(FavoriteError::MissingTarget)));

    let task = make_task(&db, &project, "k", TaskStatus::New).await;
    let both = Favorite::create(
        &db.conn,
        user,
        &CreateFavorite {
            project_id: Some(project.id),
            task_id: Some(task.id),
        },
        Uuid::new_v4(),
    )
    .await;
    assert!(matches!(both, Err(FavoriteError::AmbiguousTarget)));

    let payload = CreateFavorite {
        project_id: Some(project.id),
        task_id: None,
    };
    Favorite::create(&db.conn, user, &payload, Uuid::new_v4())
        .await
        .unwrap();
    let duplicate = Favorite::create(&db.conn, user, &payload, Uuid::new_v4()).await;
    assert!(matches!(duplicate, Err(FavoriteError::Duplicate)));

    // another user can favorite the same project
    Favorite::create(&db.conn, Uuid::new_v4(), &payload, Uuid::new_v4())
        .await
        .unwrap();

    let mine = Favorite::find_by_user(&db.conn, user).await.unwrap();
    assert_eq!(mine.len(), 1);
}

#[tokio::test]
async fn version_numbers_are_dense_from_one() {
    let db = setup().await;
    let topic = make_topic(&db, "t").await;
    let project = make_project(&db, &topic, "p").await;
    let document = Document::create(
        &db.conn,
        &CreateDocument {
            project_id: Some(project.id),
            task_id: None,
            title: "d".to_string(),
            content: None,
        },
        Uuid::new_v4(),
    )
    .await
    .unwrap();

    for expected in 1..=4 {
        let version = DocumentVersion::create(
            &db.conn,
            document.id,
            &CreateDocumentVersion {
                content: format!("rev {expected}"),
            },
            Uuid::new_v4(),
            Uuid::new_v4(),
        )
        .await
        .unwrap();
        assert_eq!(version.version_number, expected);
    }

    let versions = DocumentVersion::find_by_document(&db.conn, document.id)
        .await
        .unwrap();
    let numbers: Vec<i64> = versions.iter().map(|v| v.version_number).collect();
    assert_eq!(numbers, vec![4, 3, 2, 1]);
}

#[tokio::test]
async fn project_related_plan_loads_everything_batched() {
    let db = setup().await;
    let topic = make_topic(&db, "t").await;
    let project = make_project(&db, &topic, "p").await;
    make_task(&db, &project, "k", TaskStatus::New).await;
    Document::create(
        &db.conn,
        &CreateDocument {
            project_id: Some(project.id),
            task_id: None,
            title: "d".to_string(),
            content: None,
        },
        Uuid::new_v4(),
    )
    .await
    .unwrap();

    let related = Project::find_with_related(&db.conn).await.unwrap();
    assert_eq!(related.len(), 1);
    let p = &related[0];
    assert_eq!(p.topic.as_ref().unwrap().id, topic.id);
    assert_eq!(p.tasks.len(), 1);
    assert_eq!(p.documents.len(), 1);
    assert!(p.settings.is_none());
}

#[tokio::test]
async fn task_related_plan_resolves_parent_chain() {
    let db = setup().await;
    let topic = make_topic(&db, "t").await;
    let project = make_project(&db, &topic, "p").await;
    let task = make_task(&db, &project, "k", TaskStatus::New).await;

    let related = Task::find_by_id_with_related(&db.conn, task.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(related.project.as_ref().unwrap().id, project.id);
    assert_eq!(related.topic.as_ref().unwrap().id, topic.id);
    assert!(related.detail.is_none());
    assert!(related.subtasks.is_empty());
}

#[tokio::test]
async fn single_entity_counts_agree_with_children() {
    let db = setup().await;
    let topic = make_topic(&db, "t").await;
    let project = make_project(&db, &topic, "p").await;
    let task = make_task(&db, &project, "k", TaskStatus::InProgress).await;
    make_task(&db, &project, "done", TaskStatus::Done).await;
    make_task(&db, &project, "parked", TaskStatus::Review).await;

    assert_eq!(
        Project::active_tasks_count(&db.conn, project.id).await.unwrap(),
        1
    );
    assert_eq!(
        Project::completed_tasks_count(&db.conn, project.id).await.unwrap(),
        1
    );

    assert_eq!(Task::subtasks_count(&db.conn, task.id).await.unwrap(), 0);
    Subtask::create(
        &db.conn,
        &CreateSubtask {
            task_id: task.id,
            title: "s".to_string(),
            description: None,
            status: None,
        },
        Uuid::new_v4(),
    )
    .await
    .unwrap();
    Comment::create(
        &db.conn,
        &CreateComment {
            task_id: Some(task.id),
            subtask_id: None,
            content: "note".to_string(),
        },
        Uuid::new_v4(),
        Uuid::new_v4(),
    )
    .await
    .unwrap();
    assert_eq!(Task::subtasks_count(&db.conn, task.id).await.unwrap(), 1);
    assert_eq!(Task::comments_count(&db.conn, task.id).await.unwrap(), 1);
}

#[tokio::test]
async fn task_detail_upsert_stays_one_to_one() {
    let db = setup().await;
    let topic = make_topic(&db, "t").await;
    let project = make_project(&db, &topic, "p").await;
    let task = make_task(&db, &project, "k", TaskStatus::New).await;

    assert!(
        TaskDetail::find_by_task(&db.conn, task.id)
            .await
            .unwrap()
            .is_none()
    );

    let first = TaskDetail::upsert(
        &db.conn,
        task.id,
        &UpsertTaskDetail {
            requirements: Some("must parse input".to_string()),
            acceptance_criteria: None,
        },
    )
    .await
    .unwrap();

    let second = TaskDetail::upsert(
        &db.conn,
        task.id,
        &UpsertTaskDetail {
            requirements: None,
            acceptance_criteria: Some("all cases covered".to_string()),
        },
    )
    .await
    .unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(second.requirements, "must parse input");
    assert_eq!(second.acceptance_criteria, "all cases covered");

    let found = TaskDetail::find_by_task(&db.conn, task.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, first.id);
}

#[tokio::test]
async fn task_related_plan_covers_a_filtered_list() {
    let db = setup().await;
    let topic = make_topic(&db, "t").await;
    let p1 = make_project(&db, &topic, "p1").await;
    let p2 = make_project(&db, &topic, "p2").await;
    let task = make_task(&db, &p1, "wanted", TaskStatus::New).await;
    make_task(&db, &p2, "other", TaskStatus::New).await;

    Subtask::create(
        &db.conn,
        &CreateSubtask {
            task_id: task.id,
            title: "s".to_string(),
            description: None,
            status: None,
        },
        Uuid::new_v4(),
    )
    .await
    .unwrap();

    let related = Task::find_with_related(
        &db.conn,
        &TaskFilter {
            project_id: Some(p1.id),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(related.len(), 1);
    assert_eq!(related[0].id, task.id);
    assert_eq!(related[0].project.as_ref().unwrap().id, p1.id);
    assert_eq!(related[0].topic.as_ref().unwrap().id, topic.id);
    assert_eq!(related[0].subtasks.len(), 1);
}

#[tokio::test]
async fn document_versions_plan_batches_histories() {
    let db = setup().await;
    let topic = make_topic(&db, "t").await;
    let project = make_project(&db, &topic, "p").await;

    let mut documents = Vec::new();
    for title in ["d1", "d2"] {
        let document = Document::create(
            &db.conn,
            &CreateDocument {
                project_id: Some(project.id),
                task_id: None,
                title: title.to_string(),
                content: None,
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();
        for rev in 1..=2 {
            DocumentVersion::create(
                &db.conn,
                document.id,
                &CreateDocumentVersion {
                    content: format!("{title} rev {rev}"),
                },
                Uuid::new_v4(),
                Uuid::new_v4(),
            )
            .await
            .unwrap();
        }
        documents.push(document);
    }

    let with_versions = Document::find_with_versions(
        &db.conn,
        &DocumentFilter {
            project_id: Some(project.id),
            task_id: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(with_versions.len(), 2);
    for entry in &with_versions {
        let numbers: Vec<i64> = entry.versions.iter().map(|v| v.version_number).collect();
        assert_eq!(numbers, vec![2, 1]);
    }
}

#[tokio::test]
async fn comments_filter_by_subtask() {
    let db = setup().await;
    let topic = make_topic(&db, "t").await;
    let project = make_project(&db, &topic, "p").await;
    let task = make_task(&db, &project, "k", TaskStatus::New).await;
    let subtask = Subtask::create(
        &db.conn,
        &CreateSubtask {
            task_id: task.id,
            title: "s".to_string(),
            description: None,
            status: None,
        },
        Uuid::new_v4(),
    )
    .await
    .unwrap();

    Comment::create(
        &db.conn,
        &CreateComment {
            task_id: Some(task.id),
            subtask_id: None,
            content: "on task".to_string(),
        },
        Uuid::new_v4(),
        Uuid::new_v4(),
    )
    .await
    .unwrap();
    Comment::create(
        &db.conn,
        &CreateComment {
            task_id: None,
            subtask_id: Some(subtask.id),
            content: "on subtask".to_string(),
        },
        Uuid::new_v4(),
        Uuid::new_v4(),
    )
    .await
    .unwrap();

    let on_subtask = Comment::find_all(
        &db.conn,
        &CommentFilter {
            task_id: None,
            subtask_id: Some(subtask.id),
        },
    )
    .await
    .unwrap();
    assert_eq!(on_subtask.len(), 1);
    assert_eq!(on_subtask[0].content, "on subtask");
}

#[tokio::test]
async fn subtask_list_filters_by_status() {
    let db = setup().await;
    let topic = make_topic(&db, "t").await;
    let project = make_project(&db, &topic, "p").await;
    let task = make_task(&db, &project, "k", TaskStatus::New).await;

    for (title, status) in [("s1", TaskStatus::New), ("s2", TaskStatus::Done)] {
        Subtask::create(
            &db.conn,
            &CreateSubtask {
                task_id: task.id,
                title: title.to_string(),
                description: None,
                status: Some(status),
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();
    }

    let done = Subtask::find_all(
        &db.conn,
        &SubtaskFilter {
            task_id: Some(task.id),
            status: Some(TaskStatus::Done),
        },
    )
    .await
    .unwrap();
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].title, "s2");
}

#[tokio::test]
async fn timestamps_are_set_and_updated() {
    let db = setup().await;
    let before = Utc::now() - Duration::seconds(5);
    let topic = make_topic(&db, "t").await;
    assert!(topic.created_at > before);
    assert_eq!(topic.created_at, topic.updated_at);

    let updated = Topic::update(
        &db.conn,
        topic.id,
        &db::models::topic::UpdateTopic {
            name: Some("renamed".to_string()),
            description: None,
        },
    )
    .await
    .unwrap();
    assert!(updated.updated_at >= topic.updated_at);
    assert_eq!(updated.created_at, topic.created_at);

    let documents = Document::find_all(&db.conn, &DocumentFilter::default())
        .await
        .unwrap();
    assert!(documents.is_empty());
}
