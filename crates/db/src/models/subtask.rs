use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{entities::subtask, models::ids, types::TaskStatus};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Subtask {
    pub id: Uuid,
    pub task_id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateSubtask {
    pub task_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
}

#[derive(Debug, Serialize, Deserialize, TS)]
pub struct UpdateSubtask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
}

/// List-endpoint filters, combinable.
#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct SubtaskFilter {
    pub task_id: Option<Uuid>,
    pub status: Option<TaskStatus>,
}

impl Subtask {
    pub(crate) fn from_model_with(model: subtask::Model, task_uuid: Uuid) -> Self {
        Self {
            id: model.uuid,
            task_id: task_uuid,
            title: model.title,
            description: model.description,
            status: model.status,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }

    async fn from_model<C: ConnectionTrait>(db: &C, model: subtask::Model) -> Result<Self, DbErr> {
        let task_uuid = ids::task_uuid_by_id(db, model.task_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Task not found".to_string()))?;
        Ok(Self::from_model_with(model, task_uuid))
    }

    pub async fn find_all<C: ConnectionTrait>(
        db: &C,
        filter: &SubtaskFilter,
    ) -> Result<Vec<Self>, DbErr> {
        let mut query = subtask::Entity::find().order_by_desc(subtask::Column::CreatedAt);
        if let Some(task_uuid) = filter.task_id {
            let task_row_id = ids::task_id_by_uuid(db, task_uuid)
                .await?
                .ok_or(DbErr::RecordNotFound("Task not found".to_string()))?;
            query = query.filter(subtask::Column::TaskId.eq(task_row_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(subtask::Column::Status.eq(status));
        }
        let models = query.all(db).await?;

        let task_ids: Vec<i64> = models.iter().map(|m| m.task_id).collect();
        let task_uuids = ids::task_uuid_map(db, &task_ids).await?;
        models
            .into_iter()
            .map(|model| {
                let task_uuid = task_uuids
                    .get(&model.task_id)
                    .copied()
                    .ok_or(DbErr::RecordNotFound("Task not found".to_string()))?;
                Ok(Self::from_model_with(model, task_uuid))
            })
            .collect()
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = subtask::Entity::find()
            .filter(subtask::Column::Uuid.eq(id))
            .one(db)
            .await?;
        match record {
            Some(model) => Ok(Some(Self::from_model(db, model).await?)),
            None => Ok(None),
        }
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateSubtask,
        id: Uuid,
    ) -> Result<Self, DbErr> {
        let task_row_id = ids::task_id_by_uuid(db, data.task_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Task not found".to_string()))?;

        let now = Utc::now();
        let active = subtask::ActiveModel {
            uuid: Set(id),
            task_id: Set(task_row_id),
            title: Set(data.title.clone()),
            description: Set(data.description.clone().unwrap_or_default()),
            status: Set(data.status.unwrap_or_default()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model_with(model, data.task_id))
    }

    pub async fn update<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        data: &UpdateSubtask,
    ) -> Result<Self, DbErr> {
        let record = subtask::Entity::find()
            .filter(subtask::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound("Subtask not found".to_string()))?;

        let mut active: subtask::ActiveModel = record.into();
        if let Some(title) = &data.title {
            active.title = Set(title.clone());
        }
        if let Some(description) = &data.description {
            active.description = Set(description.clone());
        }
        if let Some(status) = data.status {
            active.status = Set(status);
        }
        active.updated_at = Set(Utc::now());
        let model = active.update(db).await?;
        Self::from_model(db, model).await
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
        let result = subtask::Entity::delete_many()
            .filter(subtask::Column::Uuid.eq(id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}
