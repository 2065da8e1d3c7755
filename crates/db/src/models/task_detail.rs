use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{entities::task_detail, models::ids};

/// One-to-one extension of a task holding the long-form fields.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct TaskDetail {
    pub id: Uuid,
    pub task_id: Uuid,
    pub requirements: String,
    pub acceptance_criteria: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UpsertTaskDetail {
    pub requirements: Option<String>,
    pub acceptance_criteria: Option<String>,
}

impl TaskDetail {
    pub(crate) fn from_model_with(model: task_detail::Model, task_uuid: Uuid) -> Self {
        Self {
            id: model.uuid,
            task_id: task_uuid,
            requirements: model.requirements,
            acceptance_criteria: model.acceptance_criteria,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }

    pub async fn find_by_task<C: ConnectionTrait>(
        db: &C,
        task_id: Uuid,
    ) -> Result<Option<Self>, DbErr> {
        let task_row_id = ids::task_id_by_uuid(db, task_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Task not found".to_string()))?;
        Ok(task_detail::Entity::find()
            .filter(task_detail::Column::TaskId.eq(task_row_id))
            .one(db)
            .await?
            .map(|m| Self::from_model_with(m, task_id)))
    }

    /// Creates the detail row on first write, updates it afterwards. The
    /// unique index on `task_id` keeps the relation one-to-one.
    pub async fn upsert<C: ConnectionTrait>(
        db: &C,
        task_id: Uuid,
        data: &UpsertTaskDetail,
    ) -> Result<Self, DbErr> {
        let task_row_id = ids::task_id_by_uuid(db, task_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Task not found".to_string()))?;

        let existing = task_detail::Entity::find()
            .filter(task_detail::Column::TaskId.eq(task_row_id))
            .one(db)
            .await?;

        let now = Utc::now();
        let model = match existing {
            Some(record) => {
                let mut active: task_detail::ActiveModel = record.into();
                if let Some(requirements) = &data.requirements {
                    active.requirements = Set(requirements.clone());
                }
                if let Some(criteria) = &data.acceptance_criteria {
                    active.acceptance_criteria = Set(criteria.clone());
                }
                active.updated_at = Set(now);
                active.update(db).await?
            }
            None => {
                let active = task_detail::ActiveModel {
                    uuid: Set(Uuid::new_v4()),
                    task_id: Set(task_row_id),
                    requirements: Set(data.requirements.clone().unwrap_or_default()),
                    acceptance_criteria: Set(data.acceptance_criteria.clone().unwrap_or_default()),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                };
                active.insert(db).await?
            }
        };
        Ok(Self::from_model_with(model, task_id))
    }
}
