use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{entities::comment, models::ids};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Comment {
    pub id: Uuid,
    pub task_id: Option<Uuid>,
    pub subtask_id: Option<Uuid>,
    pub content: String,
    pub author_user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateComment {
    pub task_id: Option<Uuid>,
    pub subtask_id: Option<Uuid>,
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize, TS)]
pub struct UpdateComment {
    pub content: Option<String>,
}

/// List-endpoint filters, combinable.
#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct CommentFilter {
    pub task_id: Option<Uuid>,
    pub subtask_id: Option<Uuid>,
}

impl Comment {
    pub(crate) fn from_model_with(
        model: comment::Model,
        task_uuid: Option<Uuid>,
        subtask_uuid: Option<Uuid>,
    ) -> Self {
        Self {
            id: model.uuid,
            task_id: task_uuid,
            subtask_id: subtask_uuid,
            content: model.content,
            author_user_id: model.author_user_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }

    async fn from_model<C: ConnectionTrait>(db: &C, model: comment::Model) -> Result<Self, DbErr> {
        let task_uuid = match model.task_id {
            Some(id) => ids::task_uuid_by_id(db, id).await?,
            None => None,
        };
        let subtask_uuid = match model.subtask_id {
            Some(id) => ids::subtask_uuid_by_id(db, id).await?,
            None => None,
        };
        Ok(Self::from_model_with(model, task_uuid, subtask_uuid))
    }

    async fn from_models<C: ConnectionTrait>(
        db: &C,
        models: Vec<comment::Model>,
    ) -> Result<Vec<Self>, DbErr> {
        let task_ids: Vec<i64> = models.iter().filter_map(|m| m.task_id).collect();
        let subtask_ids: Vec<i64> = models.iter().filter_map(|m| m.subtask_id).collect();
        let task_uuids = ids::task_uuid_map(db, &task_ids).await?;
        let subtask_uuids = ids::subtask_uuid_map(db, &subtask_ids).await?;
        Ok(models
            .into_iter()
            .map(|model| {
                let task_uuid = model.task_id.and_then(|id| task_uuids.get(&id).copied());
                let subtask_uuid = model
                    .subtask_id
                    .and_then(|id| subtask_uuids.get(&id).copied());
                Self::from_model_with(model, task_uuid, subtask_uuid)
            })
            .collect())
    }

    pub async fn find_all<C: ConnectionTrait>(
        db: &C,
        filter: &CommentFilter,
    ) -> Result<Vec<Self>, DbErr> {
        let mut query = comment::Entity::find().order_by_desc(comment::Column::CreatedAt);
        if let Some(task_uuid) = filter.task_id {
            let task_row_id = ids::task_id_by_uuid(db, task_uuid)
                .await?
                .ok_or(DbErr::RecordNotFound("Task not found".to_string()))?;
            query = query.filter(comment::Column::TaskId.eq(task_row_id));
        }
        if let Some(subtask_uuid) = filter.subtask_id {
            let subtask_row_id = ids::subtask_id_by_uuid(db, subtask_uuid)
                .await?
                .ok_or(DbErr::RecordNotFound("Subtask not found".to_string()))?;
            query = query.filter(comment::Column::SubtaskId.eq(subtask_row_id));
        }
        let models = query.all(db).await?;
        Self::from_models(db, models).await
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = comment::Entity::find()
            .filter(comment::Column::Uuid.eq(id))
            .one(db)
            .await?;
        match record {
            Some(model) => Ok(Some(Self::from_model(db, model).await?)),
            None => Ok(None),
        }
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateComment,
        author_user_id: Uuid,
        id: Uuid,
    ) -> Result<Self, DbErr> {
        let task_row_id = match data.task_id {
            Some(uuid) => Some(
                ids::task_id_by_uuid(db, uuid)
                    .await?
                    .ok_or(DbErr::RecordNotFound("Task not found".to_string()))?,
            ),
            None => None,
        };
        let subtask_row_id = match data.subtask_id {
            Some(uuid) => Some(
                ids::subtask_id_by_uuid(db, uuid)
                    .await?
                    .ok_or(DbErr::RecordNotFound("Subtask not found".to_string()))?,
            ),
            None => None,
        };

        let now = Utc::now();
        let active = comment::ActiveModel {
            uuid: Set(id),
            task_id: Set(task_row_id),
            subtask_id: Set(subtask_row_id),
            content: Set(data.content.clone()),
            author_user_id: Set(author_user_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model_with(model, data.task_id, data.subtask_id))
    }

    pub async fn update<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        data: &UpdateComment,
    ) -> Result<Self, DbErr> {
        let record = comment::Entity::find()
            .filter(comment::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound("Comment not found".to_string()))?;

        let mut active: comment::ActiveModel = record.into();
        if let Some(content) = &data.content {
            active.content = Set(content.clone());
        }
        active.updated_at = Set(Utc::now());
        let model = active.update(db).await?;
        Self::from_model(db, model).await
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
        let result = comment::Entity::delete_many()
            .filter(comment::Column::Uuid.eq(id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}
