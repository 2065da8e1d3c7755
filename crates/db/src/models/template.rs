use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{entities::template, models::ids};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Template {
    pub id: Uuid,
    pub topic_id: Uuid,
    pub name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateTemplate {
    pub topic_id: Uuid,
    pub name: String,
    pub content: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, TS)]
pub struct UpdateTemplate {
    pub name: Option<String>,
    pub content: Option<String>,
}

impl Template {
    pub(crate) fn from_model_with(model: template::Model, topic_uuid: Uuid) -> Self {
        Self {
            id: model.uuid,
            topic_id: topic_uuid,
            name: model.name,
            content: model.content,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }

    async fn from_model<C: ConnectionTrait>(db: &C, model: template::Model) -> Result<Self, DbErr> {
        let topic_uuid = ids::topic_uuid_by_id(db, model.topic_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Topic not found".to_string()))?;
        Ok(Self::from_model_with(model, topic_uuid))
    }

    pub async fn find_all<C: ConnectionTrait>(
        db: &C,
        topic_id: Option<Uuid>,
    ) -> Result<Vec<Self>, DbErr> {
        let mut query = template::Entity::find().order_by_desc(template::Column::CreatedAt);
        if let Some(topic_uuid) = topic_id {
            let topic_row_id = ids::topic_id_by_uuid(db, topic_uuid)
                .await?
                .ok_or(DbErr::RecordNotFound("Topic not found".to_string()))?;
            query = query.filter(template::Column::TopicId.eq(topic_row_id));
        }
        let models = query.all(db).await?;

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

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = template::Entity::find()
            .filter(template::Column::Uuid.eq(id))
            .one(db)
            .await?;
        match record {
            Some(model) => Ok(Some(Self::from_model(db, model).await?)),
            None => Ok(None),
        }
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateTemplate,
        id: Uuid,
    ) -> Result<Self, DbErr> {
        let topic_row_id = ids::topic_id_by_uuid(db, data.topic_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Topic not found".to_string()))?;

        let now = Utc::now();
        let active = template::ActiveModel {
            uuid: Set(id),
            topic_id: Set(topic_row_id),
            name: Set(data.name.clone()),
            content: Set(data.content.clone().unwrap_or_default()),
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
        data: &UpdateTemplate,
    ) -> Result<Self, DbErr> {
        let record = template::Entity::find()
            .filter(template::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound("Template not found".to_string()))?;

        let mut active: template::ActiveModel = record.into();
        if let Some(name) = &data.name {
            active.name = Set(name.clone());
        }
        if let Some(content) = &data.content {
            active.content = Set(content.clone());
        }
        active.updated_at = Set(Utc::now());
        let model = active.update(db).await?;
        Self::from_model(db, model).await
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
        let result = template::Entity::delete_many()
            .filter(template::Column::Uuid.eq(id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}
