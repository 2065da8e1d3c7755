use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, SqlErr,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use uuid::Uuid;

use crate::{entities::favorite, models::ids};

#[derive(Debug, Error)]
pub enum FavoriteError {
    #[error("a favorite must reference a project or a task")]
    MissingTarget,
    #[error("a favorite cannot reference both a project and a task")]
    AmbiguousTarget,
    #[error("already favorited")]
    Duplicate,
    #[error(transparent)]
    Database(#[from] DbErr),
}

/// A per-user bookmark of exactly one project or one task.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Favorite {
    pub id: Uuid,
    pub user_id: Uuid,
    pub project_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateFavorite {
    pub project_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
}

impl Favorite {
    fn from_model_with(
        model: favorite::Model,
        project_uuid: Option<Uuid>,
        task_uuid: Option<Uuid>,
    ) -> Self {
        Self {
            id: model.uuid,
            user_id: model.user_id,
            project_id: project_uuid,
            task_id: task_uuid,
            created_at: model.created_at,
        }
    }

    pub async fn find_by_user<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
    ) -> Result<Vec<Self>, DbErr> {
        let models = favorite::Entity::find()
            .filter(favorite::Column::UserId.eq(user_id))
            .order_by_desc(favorite::Column::CreatedAt)
            .all(db)
            .await?;

        let project_ids: Vec<i64> = models.iter().filter_map(|m| m.project_id).collect();
        let task_ids: Vec<i64> = models.iter().filter_map(|m| m.task_id).collect();
        let project_uuids = ids::project_uuid_map(db, &project_ids).await?;
        let task_uuids = ids::task_uuid_map(db, &task_ids).await?;

        Ok(models
            .into_iter()
            .map(|model| {
                let project_uuid = model
                    .project_id
                    .and_then(|id| project_uuids.get(&id).copied());
                let task_uuid = model.task_id.and_then(|id| task_uuids.get(&id).copied());
                Self::from_model_with(model, project_uuid, task_uuid)
            })
            .collect())
    }

    /// Bookmarks exactly one target for the user. Target exclusivity is
    /// checked up front; the per-user unique indexes turn a raced duplicate
    /// into [`FavoriteError::Duplicate`].
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        data: &CreateFavorite,
        id: Uuid,
    ) -> Result<Self, FavoriteError> {
        let (project_row_id, task_row_id) = match (data.project_id, data.task_id) {
            (None, None) => return Err(FavoriteError::MissingTarget),
            (Some(_), Some(_)) => return Err(FavoriteError::AmbiguousTarget),
            (Some(project_uuid), None) => {
                let row_id = ids::project_id_by_uuid(db, project_uuid)
                    .await?
                    .ok_or(DbErr::RecordNotFound("Project not found".to_string()))?;
                (Some(row_id), None)
            }
            (None, Some(task_uuid)) => {
                let row_id = ids::task_id_by_uuid(db, task_uuid)
                    .await?
                    .ok_or(DbErr::RecordNotFound("Task not found".to_string()))?;
                (None, Some(row_id))
            }
        };

        let active = favorite::ActiveModel {
            uuid: Set(id),
            user_id: Set(user_id),
            project_id: Set(project_row_id),
            task_id: Set(task_row_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        let model = match active.insert(db).await {
            Ok(model) => model,
            Err(err) => {
                if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                    return Err(FavoriteError::Duplicate);
                }
                return Err(err.into());
            }
        };
        Ok(Self::from_model_with(model, data.project_id, data.task_id))
    }

    /// Removes a favorite, scoped to its owner. Returns the number of rows
    /// deleted.
    pub async fn delete<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<u64, DbErr> {
        let result = favorite::Entity::delete_many()
            .filter(favorite::Column::Uuid.eq(id))
            .filter(favorite::Column::UserId.eq(user_id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}
