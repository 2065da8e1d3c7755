use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, ExprTrait, JoinType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{
    entities::{project, task, topic},
    models::ids,
    types::TaskStatus,
};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Topic {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateTopic {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, TS)]
pub struct UpdateTopic {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct TopicWithStats {
    #[serde(flatten)]
    #[ts(flatten)]
    pub topic: Topic,
    pub total_projects: i64,
    pub active_projects: i64,
    pub completed_projects: i64,
}

impl std::ops::Deref for TopicWithStats {
    type Target = Topic;
    fn deref(&self) -> &Self::Target {
        &self.topic
    }
}

impl Topic {
    pub(crate) fn from_model(model: topic::Model) -> Self {
        Self {
            id: model.uuid,
            name: model.name,
            description: model.description,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        Ok(topic::Entity::find()
            .filter(topic::Column::Uuid.eq(id))
            .one(db)
            .await?
            .map(Self::from_model))
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateTopic,
        id: Uuid,
    ) -> Result<Self, DbErr> {
        let now = Utc::now();
        let active = topic::ActiveModel {
            uuid: Set(id),
            name: Set(data.name.clone()),
            description: Set(data.description.clone().unwrap_or_default()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        Ok(Self::from_model(active.insert(db).await?))
    }

    pub async fn update<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        data: &UpdateTopic,
    ) -> Result<Self, DbErr> {
        let record = topic::Entity::find()
            .filter(topic::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound("Topic not found".to_string()))?;

        let mut active: topic::ActiveModel = record.into();
        if let Some(name) = &data.name {
            active.name = Set(name.clone());
        }
        if let Some(description) = &data.description {
            active.description = Set(description.clone());
        }
        active.updated_at = Set(Utc::now());
        Ok(Self::from_model(active.update(db).await?))
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
        let result = topic::Entity::delete_many()
            .filter(topic::Column::Uuid.eq(id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Count of distinct projects under the topic with at least one task in
    /// an active status. Deduplicated through the tasks join so a project
    /// with several active tasks counts once.
    pub async fn active_projects_count<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
    ) -> Result<u64, DbErr> {
        let topic_row_id = ids::topic_id_by_uuid(db, id)
            .await?
            .ok_or(DbErr::RecordNotFound("Topic not found".to_string()))?;
        Self::distinct_project_count_for(db, topic_row_id, TaskStatus::ACTIVE.to_vec()).await
    }

    /// Distinct count of the topic's projects with at least one task in one
    /// of the given statuses.
    async fn distinct_project_count_for<C: ConnectionTrait>(
        db: &C,
        topic_row_id: i64,
        statuses: Vec<TaskStatus>,
    ) -> Result<u64, DbErr> {
        project::Entity::find()
            .join(JoinType::InnerJoin, project::Relation::Tasks.def())
            .filter(project::Column::TopicId.eq(topic_row_id))
            .filter(task::Column::Status.is_in(statuses))
            .distinct()
            .count(db)
            .await
    }

    /// Single topic with its project statistics.
    pub async fn find_by_id_with_stats<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
    ) -> Result<Option<TopicWithStats>, DbErr> {
        let Some(topic) = Self::find_by_id(db, id).await? else {
            return Ok(None);
        };
        let topic_row_id = ids::topic_id_by_uuid(db, id)
            .await?
            .ok_or(DbErr::RecordNotFound("Topic not found".to_string()))?;

        let total = project::Entity::find()
            .filter(project::Column::TopicId.eq(topic_row_id))
            .count(db)
            .await?;
        let active = Self::distinct_project_count_for(db, topic_row_id, TaskStatus::ACTIVE.to_vec())
            .await?;
        let completed =
            Self::distinct_project_count_for(db, topic_row_id, vec![TaskStatus::Done]).await?;

        Ok(Some(TopicWithStats {
            topic,
            total_projects: total as i64,
            active_projects: active as i64,
            completed_projects: completed as i64,
        }))
    }

    /// All topics annotated with project statistics. Three grouped queries
    /// for the whole list, never one per row.
    pub async fn find_all_with_stats<C: ConnectionTrait>(
        db: &C,
    ) -> Result<Vec<TopicWithStats>, DbErr> {
        let models = topic::Entity::find()
            .order_by_desc(topic::Column::CreatedAt)
            .all(db)
            .await?;

        let totals: HashMap<i64, i64> = project::Entity::find()
            .select_only()
            .column(project::Column::TopicId)
            .column_as(project::Column::Id.count(), "cnt")
            .group_by(project::Column::TopicId)
            .into_tuple::<(i64, i64)>()
            .all(db)
            .await?
            .into_iter()
            .collect();

        let active = Self::distinct_project_counts(db, TaskStatus::ACTIVE.to_vec()).await?;
        let completed = Self::distinct_project_counts(db, vec![TaskStatus::Done]).await?;

        Ok(models
            .into_iter()
            .map(|model| {
                let row_id = model.id;
                TopicWithStats {
                    topic: Self::from_model(model),
                    total_projects: totals.get(&row_id).copied().unwrap_or(0),
                    active_projects: active.get(&row_id).copied().unwrap_or(0),
                    completed_projects: completed.get(&row_id).copied().unwrap_or(0),
                }
            })
            .collect())
    }

    /// Topics that currently have at least one active project.
    pub async fn find_active<C: ConnectionTrait>(db: &C) -> Result<Vec<TopicWithStats>, DbErr> {
        let mut topics = Self::find_all_with_stats(db).await?;
        topics.retain(|topic| topic.active_projects > 0);
        Ok(topics)
    }

    /// Per-topic count of distinct projects having at least one task in one
    /// of the given statuses.
    async fn distinct_project_counts<C: ConnectionTrait>(
        db: &C,
        statuses: Vec<TaskStatus>,
    ) -> Result<HashMap<i64, i64>, DbErr> {
        let rows: Vec<(i64, i64)> = project::Entity::find()
            .select_only()
            .column(project::Column::TopicId)
            .column_as(
                Expr::col((project::Entity, project::Column::Id)).count_distinct(),
                "cnt",
            )
            .join(JoinType::InnerJoin, project::Relation::Tasks.def())
            .filter(task::Column::Status.is_in(statuses))
            .group_by(project::Column::TopicId)
            .into_tuple()
            .all(db)
            .await?;
        Ok(rows.into_iter().collect())
    }
}
