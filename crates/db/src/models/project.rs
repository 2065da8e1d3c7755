use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{
    entities::{document, project, task, topic},
    fetch_plan::{FetchPlan, FetchPlanError, PROJECT_WITH_RELATED},
    models::{
        document::Document, ids, project_settings::ProjectSettings, task::Task, topic::Topic,
    },
    types::TaskStatus,
};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Project {
    pub id: Uuid,
    pub topic_id: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateProject {
    pub topic_id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, TS)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ProjectWithStats {
    #[serde(flatten)]
    #[ts(flatten)]
    pub project: Project,
    pub settings: Option<ProjectSettings>,
    pub total_tasks: i64,
    pub active_tasks: i64,
    pub completed_tasks: i64,
}

impl std::ops::Deref for ProjectWithStats {
    type Target = Project;
    fn deref(&self) -> &Self::Target {
        &self.project
    }
}

/// Result of executing [`PROJECT_WITH_RELATED`].
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ProjectWithRelated {
    #[serde(flatten)]
    #[ts(flatten)]
    pub project: Project,
    pub topic: Option<Topic>,
    pub settings: Option<ProjectSettings>,
    pub tasks: Vec<Task>,
    pub documents: Vec<Document>,
}

impl Project {
    pub(crate) fn from_model_with(model: project::Model, topic_uuid: Uuid) -> Self {
        Self {
            id: model.uuid,
            topic_id: topic_uuid,
            name: model.name,
            description: model.description,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }

    async fn from_model<C: ConnectionTrait>(db: &C, model: project::Model) -> Result<Self, DbErr> {
        let topic_uuid = ids::topic_uuid_by_id(db, model.topic_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Topic not found".to_string()))?;
        Ok(Self::from_model_with(model, topic_uuid))
    }

    async fn from_models<C: ConnectionTrait>(
        db: &C,
        models: Vec<project::Model>,
    ) -> Result<Vec<Self>, DbErr> {
        let topic_ids: Vec<i64> = models.iter().map(|m| m.topic_id).collect();
        let topic_uuids = ids::topic_uuid_map(db, &topic_ids).await?;
        models
            .into_iter()
            .map(|model| {
                let topic_uuid = topic_uuids
                    .get(&model.topic_id)
                    .copied()
                    .ok_or(DbErr::RecordNotFound("Topic not found".to_string()))?;
                Ok(Self::from_model_with(model, topic_uuid))
            })
            .collect()
    }

    pub async fn find_all<C: ConnectionTrait>(
        db: &C,
        topic_id: Option<Uuid>,
    ) -> Result<Vec<Self>, DbErr> {
        let models = Self::filtered(db, topic_id).await?;
        Self::from_models(db, models).await
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = project::Entity::find()
            .filter(project::Column::Uuid.eq(id))
            .one(db)
            .await?;
        match record {
            Some(model) => Ok(Some(Self::from_model(db, model).await?)),
            None => Ok(None),
        }
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateProject,
        id: Uuid,
    ) -> Result<Self, DbErr> {
        let topic_row_id = ids::topic_id_by_uuid(db, data.topic_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Topic not found".to_string()))?;

        let now = Utc::now();
        let active = project::ActiveModel {
            uuid: Set(id),
            topic_id: Set(topic_row_id),
            name: Set(data.name.clone()),
            description: Set(data.description.clone().unwrap_or_default()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model_with(model, data.topic_id))
    }

    pub async fn update<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        data: &UpdateProject,
    ) -> Result<Self, DbErr> {
        let record = project::Entity::find()
            .filter(project::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound("Project not found".to_string()))?;

        let mut active: project::ActiveModel = record.into();
        if let Some(name) = &data.name {
            active.name = Set(name.clone());
        }
        if let Some(description) = &data.description {
            active.description = Set(description.clone());
        }
        active.updated_at = Set(Utc::now());
        let model = active.update(db).await?;
        Self::from_model(db, model).await
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
        let result = project::Entity::delete_many()
            .filter(project::Column::Uuid.eq(id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Single project with its task statistics and settings.
    pub async fn find_by_id_with_stats<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
    ) -> Result<Option<ProjectWithStats>, DbErr> {
        let Some(project) = Self::find_by_id(db, id).await? else {
            return Ok(None);
        };
        let project_row_id = ids::project_id_by_uuid(db, id)
            .await?
            .ok_or(DbErr::RecordNotFound("Project not found".to_string()))?;

        let total = task::Entity::find()
            .filter(task::Column::ProjectId.eq(project_row_id))
            .count(db)
            .await?;
        let active = Self::count_tasks(db, id, TaskStatus::ACTIVE.to_vec()).await?;
        let completed = Self::count_tasks(db, id, vec![TaskStatus::Done]).await?;
        let settings = ProjectSettings::find_by_project(db, id).await?;

        Ok(Some(ProjectWithStats {
            project,
            settings,
            total_tasks: total as i64,
            active_tasks: active as i64,
            completed_tasks: completed as i64,
        }))
    }

    pub async fn active_tasks_count<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
        Self::count_tasks(db, id, TaskStatus::ACTIVE.to_vec()).await
    }

    pub async fn completed_tasks_count<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
        Self::count_tasks(db, id, vec![TaskStatus::Done]).await
    }

    async fn count_tasks<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        statuses: Vec<TaskStatus>,
    ) -> Result<u64, DbErr> {
        let project_row_id = ids::project_id_by_uuid(db, id)
            .await?
            .ok_or(DbErr::RecordNotFound("Project not found".to_string()))?;
        task::Entity::find()
            .filter(task::Column::ProjectId.eq(project_row_id))
            .filter(task::Column::Status.is_in(statuses))
            .count(db)
            .await
    }

    /// Projects annotated with task statistics and their settings. One
    /// grouped query over tasks plus one batched settings query for the
    /// whole list.
    pub async fn find_all_with_stats<C: ConnectionTrait>(
        db: &C,
        topic_id: Option<Uuid>,
    ) -> Result<Vec<ProjectWithStats>, DbErr> {
        let models = Self::filtered(db, topic_id).await?;
        let row_ids: Vec<i64> = models.iter().map(|m| m.id).collect();

        let rows: Vec<(i64, TaskStatus, i64)> = task::Entity::find()
            .select_only()
            .column(task::Column::ProjectId)
            .column(task::Column::Status)
            .column_as(task::Column::Id.count(), "cnt")
            .filter(task::Column::ProjectId.is_in(row_ids.iter().copied()))
            .group_by(task::Column::ProjectId)
            .group_by(task::Column::Status)
            .into_tuple()
            .all(db)
            .await?;

        let mut totals: HashMap<i64, (i64, i64, i64)> = HashMap::new();
        for (project_row_id, status, count) in rows {
            let entry = totals.entry(project_row_id).or_default();
            entry.0 += count;
            if status.is_active() {
                entry.1 += count;
            } else if status == TaskStatus::Done {
                entry.2 += count;
            }
        }

        let settings = ProjectSettings::find_by_project_row_ids(db, &row_ids).await?;
        let projects = Self::from_models(db, models).await?;

        Ok(row_ids
            .into_iter()
            .zip(projects)
            .map(|(row_id, project)| {
                let (total, active, completed) = totals.get(&row_id).copied().unwrap_or_default();
                ProjectWithStats {
                    project,
                    settings: settings.get(&row_id).cloned(),
                    total_tasks: total,
                    active_tasks: active,
                    completed_tasks: completed,
                }
            })
            .collect())
    }

    /// Executes a project fetch plan. Each relation in the plan costs one
    /// batched query across the whole result set.
    pub async fn find_with_plan<C: ConnectionTrait>(
        db: &C,
        plan: &FetchPlan,
    ) -> Result<Vec<ProjectWithRelated>, FetchPlanError> {
        plan.validate()?;

        let models = project::Entity::find()
            .order_by_desc(project::Column::CreatedAt)
            .all(db)
            .await?;
        let row_ids: Vec<i64> = models.iter().map(|m| m.id).collect();

        let topics: HashMap<i64, Topic> = if plan.includes("topic") {
            let topic_ids: Vec<i64> = models.iter().map(|m| m.topic_id).collect();
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

        let settings = if plan.includes("settings") {
            ProjectSettings::find_by_project_row_ids(db, &row_ids).await?
        } else {
            HashMap::new()
        };

        let mut tasks: HashMap<i64, Vec<Task>> = HashMap::new();
        if plan.includes("tasks") {
            let task_models = task::Entity::find()
                .filter(task::Column::ProjectId.is_in(row_ids.iter().copied()))
                .order_by_desc(task::Column::CreatedAt)
                .all(db)
                .await?;
            let project_uuids: HashMap<i64, Uuid> =
                models.iter().map(|m| (m.id, m.uuid)).collect();
            for model in task_models {
                let project_uuid = project_uuids
                    .get(&model.project_id)
                    .copied()
                    .ok_or(DbErr::RecordNotFound("Project not found".to_string()))?;
                tasks
                    .entry(model.project_id)
                    .or_default()
                    .push(Task::from_model_with(model, project_uuid));
            }
        }

        let mut documents: HashMap<i64, Vec<Document>> = HashMap::new();
        if plan.includes("documents") {
            let doc_models = document::Entity::find()
                .filter(document::Column::ProjectId.is_in(row_ids.iter().copied()))
                .all(db)
                .await?;
            let task_ids: Vec<i64> = doc_models.iter().filter_map(|m| m.task_id).collect();
            let task_uuids = ids::task_uuid_map(db, &task_ids).await?;
            let project_uuids: HashMap<i64, Uuid> =
                models.iter().map(|m| (m.id, m.uuid)).collect();
            for model in doc_models {
                let Some(project_row_id) = model.project_id else {
                    continue;
                };
                let project_uuid = project_uuids.get(&project_row_id).copied();
                let task_uuid = model.task_id.and_then(|id| task_uuids.get(&id).copied());
                documents
                    .entry(project_row_id)
                    .or_default()
                    .push(Document::from_model_with(model, project_uuid, task_uuid));
            }
        }

        let topic_row_ids: Vec<i64> = models.iter().map(|m| m.topic_id).collect();
        let projects = Self::from_models(db, models).await?;
        Ok(row_ids
            .into_iter()
            .zip(topic_row_ids)
            .zip(projects)
            .map(|((row_id, topic_row_id), project)| ProjectWithRelated {
                topic: topics.get(&topic_row_id).cloned(),
                settings: settings.get(&row_id).cloned(),
                tasks: tasks.remove(&row_id).unwrap_or_default(),
                documents: documents.remove(&row_id).unwrap_or_default(),
                project,
            })
            .collect())
    }

    pub async fn find_with_related<C: ConnectionTrait>(
        db: &C,
    ) -> Result<Vec<ProjectWithRelated>, FetchPlanError> {
        Self::find_with_plan(db, &PROJECT_WITH_RELATED).await
    }

    async fn filtered<C: ConnectionTrait>(
        db: &C,
        topic_id: Option<Uuid>,
    ) -> Result<Vec<project::Model>, DbErr> {
        let mut query = project::Entity::find().order_by_desc(project::Column::CreatedAt);
        if let Some(topic_uuid) = topic_id {
            let topic_row_id = ids::topic_id_by_uuid(db, topic_uuid)
                .await?
                .ok_or(DbErr::RecordNotFound("Topic not found".to_string()))?;
            query = query.filter(project::Column::TopicId.eq(topic_row_id));
        }
        query.all(db).await
    }
}
