use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{
    entities::{comment, document, project, subtask, task, task_detail, topic},
    fetch_plan::{FetchPlan, FetchPlanError, TASK_WITH_RELATED},
    models::{
        comment::Comment, document::Document, ids, project::Project, subtask::Subtask,
        task_detail::TaskDetail, topic::Topic,
    },
    types::TaskStatus,
};

/// Active tasks older than this are considered overdue.
pub const OVERDUE_AFTER_DAYS: i64 = 7;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Task {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub assignee_user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateTask {
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub assignee_user_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, TS)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub assignee_user_id: Option<Option<Uuid>>,
}

/// List-endpoint filters. All optional and combinable.
#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct TaskFilter {
    pub project_id: Option<Uuid>,
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub active_only: bool,
    #[serde(default)]
    pub overdue: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct TaskWithStats {
    #[serde(flatten)]
    #[ts(flatten)]
    pub task: Task,
    pub subtasks_count: i64,
    pub completed_subtasks_count: i64,
    pub comments_count: i64,
    pub is_overdue: bool,
}

impl std::ops::Deref for TaskWithStats {
    type Target = Task;
    fn deref(&self) -> &Self::Target {
        &self.task
    }
}

/// Result of executing [`TASK_WITH_RELATED`].
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct TaskWithRelated {
    #[serde(flatten)]
    #[ts(flatten)]
    pub task: Task,
    pub project: Option<Project>,
    pub topic: Option<Topic>,
    pub detail: Option<TaskDetail>,
    pub subtasks: Vec<Subtask>,
    pub comments: Vec<Comment>,
    pub documents: Vec<Document>,
}

impl std::ops::Deref for TaskWithRelated {
    type Target = Task;
    fn deref(&self) -> &Self::Target {
        &self.task
    }
}

impl Task {
    pub(crate) fn from_model_with(model: task::Model, project_uuid: Uuid) -> Self {
        Self {
            id: model.uuid,
            project_id: project_uuid,
            title: model.title,
            description: model.description,
            status: model.status,
            assignee_user_id: model.assignee_user_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }

    async fn from_model<C: ConnectionTrait>(db: &C, model: task::Model) -> Result<Self, DbErr> {
        let project_uuid = ids::project_uuid_by_id(db, model.project_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Project not found".to_string()))?;
        Ok(Self::from_model_with(model, project_uuid))
    }

    async fn from_models<C: ConnectionTrait>(
        db: &C,
        models: Vec<task::Model>,
    ) -> Result<Vec<Self>, DbErr> {
        let project_ids: Vec<i64> = models.iter().map(|m| m.project_id).collect();
        let project_uuids = ids::project_uuid_map(db, &project_ids).await?;
        models
            .into_iter()
            .map(|model| {
                let project_uuid = project_uuids
                    .get(&model.project_id)
                    .copied()
                    .ok_or(DbErr::RecordNotFound("Project not found".to_string()))?;
                Ok(Self::from_model_with(model, project_uuid))
            })
            .collect()
    }

    pub fn is_overdue(&self) -> bool {
        self.is_overdue_at(Utc::now())
    }

    /// A task is overdue when it is still in an active status and was
    /// created more than [`OVERDUE_AFTER_DAYS`] ago.
    pub fn is_overdue_at(&self, now: DateTime<Utc>) -> bool {
        self.status.is_active() && self.created_at < now - Duration::days(OVERDUE_AFTER_DAYS)
    }

    pub async fn find_all<C: ConnectionTrait>(
        db: &C,
        filter: &TaskFilter,
    ) -> Result<Vec<Self>, DbErr> {
        let models = Self::filtered(db, filter).await?;
        Self::from_models(db, models).await
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = task::Entity::find()
            .filter(task::Column::Uuid.eq(id))
            .one(db)
            .await?;
        match record {
            Some(model) => Ok(Some(Self::from_model(db, model).await?)),
            None => Ok(None),
        }
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateTask,
        id: Uuid,
    ) -> Result<Self, DbErr> {
        let project_row_id = ids::project_id_by_uuid(db, data.project_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Project not found".to_string()))?;

        let now = Utc::now();
        let active = task::ActiveModel {
            uuid: Set(id),
            project_id: Set(project_row_id),
            title: Set(data.title.clone()),
            description: Set(data.description.clone().unwrap_or_default()),
            status: Set(data.status.unwrap_or_default()),
            assignee_user_id: Set(data.assignee_user_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model_with(model, data.project_id))
    }

    pub async fn update<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        data: &UpdateTask,
    ) -> Result<Self, DbErr> {
        let record = task::Entity::find()
            .filter(task::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound("Task not found".to_string()))?;

        let mut active: task::ActiveModel = record.into();
        if let Some(title) = &data.title {
            active.title = Set(title.clone());
        }
        if let Some(description) = &data.description {
            active.description = Set(description.clone());
        }
        if let Some(status) = data.status {
            active.status = Set(status);
        }
        if let Some(assignee) = data.assignee_user_id {
            active.assignee_user_id = Set(assignee);
        }
        active.updated_at = Set(Utc::now());
        let model = active.update(db).await?;
        Self::from_model(db, model).await
    }

    pub async fn update_status<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        status: TaskStatus,
    ) -> Result<Self, DbErr> {
        Self::update(
            db,
            id,
            &UpdateTask {
                title: None,
                description: None,
                status: Some(status),
                assignee_user_id: None,
            },
        )
        .await
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
        let result = task::Entity::delete_many()
            .filter(task::Column::Uuid.eq(id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Clears the assignee from every task held by the given user. Used
    /// when a user is deactivated upstream. Returns the number of tasks
    /// touched.
    pub async fn unassign_user<C: ConnectionTrait>(db: &C, user_id: Uuid) -> Result<u64, DbErr> {
        let result = task::Entity::update_many()
            .col_expr(task::Column::AssigneeUserId, Expr::value(Option::<Uuid>::None))
            .col_expr(task::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(task::Column::AssigneeUserId.eq(user_id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn subtasks_count<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
        let task_row_id = ids::task_id_by_uuid(db, id)
            .await?
            .ok_or(DbErr::RecordNotFound("Task not found".to_string()))?;
        subtask::Entity::find()
            .filter(subtask::Column::TaskId.eq(task_row_id))
            .count(db)
            .await
    }

    pub async fn comments_count<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
        let task_row_id = ids::task_id_by_uuid(db, id)
            .await?
            .ok_or(DbErr::RecordNotFound("Task not found".to_string()))?;
        comment::Entity::find()
            .filter(comment::Column::TaskId.eq(task_row_id))
            .count(db)
            .await
    }

    /// Tasks annotated with subtask and comment counts. Two grouped queries
    /// for the whole list regardless of its length.
    pub async fn find_all_with_stats<C: ConnectionTrait>(
        db: &C,
        filter: &TaskFilter,
    ) -> Result<Vec<TaskWithStats>, DbErr> {
        let models = Self::filtered(db, filter).await?;
        let row_ids: Vec<i64> = models.iter().map(|m| m.id).collect();

        let subtask_rows: Vec<(i64, TaskStatus, i64)> = subtask::Entity::find()
            .select_only()
            .column(subtask::Column::TaskId)
            .column(subtask::Column::Status)
            .column_as(subtask::Column::Id.count(), "cnt")
            .filter(subtask::Column::TaskId.is_in(row_ids.iter().copied()))
            .group_by(subtask::Column::TaskId)
            .group_by(subtask::Column::Status)
            .into_tuple()
            .all(db)
            .await?;
        let mut subtask_counts: HashMap<i64, (i64, i64)> = HashMap::new();
        for (task_row_id, status, count) in subtask_rows {
            let entry = subtask_counts.entry(task_row_id).or_default();
            entry.0 += count;
            if status == TaskStatus::Done {
                entry.1 += count;
            }
        }

        let comment_counts: HashMap<i64, i64> = comment::Entity::find()
            .select_only()
            .column(comment::Column::TaskId)
            .column_as(comment::Column::Id.count(), "cnt")
            .filter(comment::Column::TaskId.is_in(row_ids.iter().copied()))
            .group_by(comment::Column::TaskId)
            .into_tuple::<(Option<i64>, i64)>()
            .all(db)
            .await?
            .into_iter()
            .filter_map(|(task_id, count)| task_id.map(|id| (id, count)))
            .collect();

        let now = Utc::now();
        let tasks = Self::from_models(db, models).await?;
        Ok(row_ids
            .into_iter()
            .zip(tasks)
            .map(|(row_id, task)| {
                let (total, completed) = subtask_counts.get(&row_id).copied().unwrap_or_default();
                TaskWithStats {
                    subtasks_count: total,
                    completed_subtasks_count: completed,
                    comments_count: comment_counts.get(&row_id).copied().unwrap_or(0),
                    is_overdue: task.is_overdue_at(now),
                    task,
                }
            })
            .collect())
    }

    /// Executes a task fetch plan. The project and its topic load in one
    /// batched query each; every other relation is one grouped query
    /// across the whole result set.
    pub async fn find_with_plan<C: ConnectionTrait>(
        db: &C,
        filter: &TaskFilter,
        plan: &FetchPlan,
    ) -> Result<Vec<TaskWithRelated>, FetchPlanError> {
        plan.validate()?;
        let models = Self::filtered(db, filter).await?;
        Self::load_related(db, models, plan).await
    }

    /// Single-task variant of [`Task::find_with_plan`] using
    /// [`TASK_WITH_RELATED`].
    pub async fn find_by_id_with_related<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
    ) -> Result<Option<TaskWithRelated>, FetchPlanError> {
        let Some(model) = task::Entity::find()
            .filter(task::Column::Uuid.eq(id))
            .one(db)
            .await?
        else {
            return Ok(None);
        };
        let mut related = Self::load_related(db, vec![model], &TASK_WITH_RELATED).await?;
        Ok(related.pop())
    }

    async fn load_related<C: ConnectionTrait>(
        db: &C,
        models: Vec<task::Model>,
        plan: &FetchPlan,
    ) -> Result<Vec<TaskWithRelated>, FetchPlanError> {
        let row_ids: Vec<i64> = models.iter().map(|m| m.id).collect();

        let projects: HashMap<i64, (Uuid, project::Model)> = if plan.includes("project") {
            let project_ids: Vec<i64> = models.iter().map(|m| m.project_id).collect();
            project::Entity::find()
                .filter(project::Column::Id.is_in(project_ids))
                .all(db)
                .await?
                .into_iter()
                .map(|m| (m.id, (m.uuid, m)))
                .collect()
        } else {
            HashMap::new()
        };

        let topics: HashMap<i64, Topic> = if plan.includes("project.topic") {
            let topic_ids: Vec<i64> = projects.values().map(|(_, m)| m.topic_id).collect();
            topic::Entity::find()
                .filter(topic::Column::Id.is_in(topic_ids))
                .all(db)
                .await?
                .into_iter()
                .map(|m| (m.id, Topic::from_model(m)))
                .collect()
        } else {
            HashMap::new()
        };

        // Topic uuids for project construction. Reuses the topics fetch when
        // the plan loads it, otherwise one extra lookup covers the batch.
        let project_topic_uuids: HashMap<i64, Uuid> = if plan.includes("project.topic") {
            topics.iter().map(|(row_id, t)| (*row_id, t.id)).collect()
        } else if plan.includes("project") {
            let topic_ids: Vec<i64> = projects.values().map(|(_, m)| m.topic_id).collect();
            ids::topic_uuid_map(db, &topic_ids).await?
        } else {
            HashMap::new()
        };

        let mut details: HashMap<i64, TaskDetail> = HashMap::new();
        if plan.includes("detail") {
            let task_uuids: HashMap<i64, Uuid> = models.iter().map(|m| (m.id, m.uuid)).collect();
            for model in task_detail::Entity::find()
                .filter(task_detail::Column::TaskId.is_in(row_ids.iter().copied()))
                .all(db)
                .await?
            {
                if let Some(task_uuid) = task_uuids.get(&model.task_id).copied() {
                    details.insert(model.task_id, TaskDetail::from_model_with(model, task_uuid));
                }
            }
        }

        let mut subtasks: HashMap<i64, Vec<Subtask>> = HashMap::new();
        if plan.includes("subtasks") {
            let task_uuids: HashMap<i64, Uuid> = models.iter().map(|m| (m.id, m.uuid)).collect();
            for model in subtask::Entity::find()
                .filter(subtask::Column::TaskId.is_in(row_ids.iter().copied()))
                .order_by_desc(subtask::Column::CreatedAt)
                .all(db)
                .await?
            {
                if let Some(task_uuid) = task_uuids.get(&model.task_id).copied() {
                    subtasks
                        .entry(model.task_id)
                        .or_default()
                        .push(Subtask::from_model_with(model, task_uuid));
                }
            }
        }

        let mut comments: HashMap<i64, Vec<Comment>> = HashMap::new();
        if plan.includes("comments") {
            let task_uuids: HashMap<i64, Uuid> = models.iter().map(|m| (m.id, m.uuid)).collect();
            for model in comment::Entity::find()
                .filter(comment::Column::TaskId.is_in(row_ids.iter().copied()))
                .order_by_desc(comment::Column::CreatedAt)
                .all(db)
                .await?
            {
                let Some(task_row_id) = model.task_id else {
                    continue;
                };
                let task_uuid = task_uuids.get(&task_row_id).copied();
                comments
                    .entry(task_row_id)
                    .or_default()
                    .push(Comment::from_model_with(model, task_uuid, None));
            }
        }

        let mut documents: HashMap<i64, Vec<Document>> = HashMap::new();
        if plan.includes("documents") {
            let task_uuids: HashMap<i64, Uuid> = models.iter().map(|m| (m.id, m.uuid)).collect();
            let doc_models = document::Entity::find()
                .filter(document::Column::TaskId.is_in(row_ids.iter().copied()))
                .all(db)
                .await?;
            let doc_project_ids: Vec<i64> =
                doc_models.iter().filter_map(|m| m.project_id).collect();
            let doc_project_uuids = ids::project_uuid_map(db, &doc_project_ids).await?;
            for model in doc_models {
                let Some(task_row_id) = model.task_id else {
                    continue;
                };
                let task_uuid = task_uuids.get(&task_row_id).copied();
                let project_uuid = model
                    .project_id
                    .and_then(|id| doc_project_uuids.get(&id).copied());
                documents
                    .entry(task_row_id)
                    .or_default()
                    .push(Document::from_model_with(model, project_uuid, task_uuid));
            }
        }

        let project_row_ids: Vec<i64> = models.iter().map(|m| m.project_id).collect();
        let tasks = Self::from_models(db, models).await?;
        Ok(row_ids
            .into_iter()
            .zip(project_row_ids)
            .zip(tasks)
            .map(|((row_id, project_row_id), task)| {
                let project = projects.get(&project_row_id).and_then(|(_, m)| {
                    let topic_uuid = project_topic_uuids.get(&m.topic_id).copied()?;
                    Some(Project::from_model_with(m.clone(), topic_uuid))
                });
                TaskWithRelated {
                    topic: projects
                        .get(&project_row_id)
                        .and_then(|(_, m)| topics.get(&m.topic_id).cloned()),
                    project,
                    detail: details.remove(&row_id),
                    subtasks: subtasks.remove(&row_id).unwrap_or_default(),
                    comments: comments.remove(&row_id).unwrap_or_default(),
                    documents: documents.remove(&row_id).unwrap_or_default(),
                    task,
                }
            })
            .collect())
    }

    pub async fn find_with_related<C: ConnectionTrait>(
        db: &C,
        filter: &TaskFilter,
    ) -> Result<Vec<TaskWithRelated>, FetchPlanError> {
        Self::find_with_plan(db, filter, &TASK_WITH_RELATED).await
    }

    async fn filtered<C: ConnectionTrait>(
        db: &C,
        filter: &TaskFilter,
    ) -> Result<Vec<task::Model>, DbErr> {
        let mut query = task::Entity::find().order_by_desc(task::Column::CreatedAt);
        if let Some(project_uuid) = filter.project_id {
            let project_row_id = ids::project_id_by_uuid(db, project_uuid)
                .await?
                .ok_or(DbErr::RecordNotFound("Project not found".to_string()))?;
            query = query.filter(task::Column::ProjectId.eq(project_row_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(task::Column::Status.eq(status));
        }
        if filter.active_only {
            query = query.filter(task::Column::Status.is_in(TaskStatus::ACTIVE));
        }
        if filter.overdue {
            let cutoff = Utc::now() - Duration::days(OVERDUE_AFTER_DAYS);
            query = query
                .filter(task::Column::Status.is_in(TaskStatus::ACTIVE))
                .filter(task::Column::CreatedAt.lt(cutoff));
        }
        query.all(db).await
    }
}
