use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionSession, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{entities::document_version, models::ids};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct DocumentVersion {
    pub id: Uuid,
    pub document_id: Uuid,
    pub content: String,
    pub version_number: i64,
    pub created_by_user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateDocumentVersion {
    pub content: String,
}

impl DocumentVersion {
    pub(crate) fn from_model_with(model: document_version::Model, document_uuid: Uuid) -> Self {
        Self {
            id: model.uuid,
            document_id: document_uuid,
            content: model.content,
            version_number: model.version_number,
            created_by_user_id: model.created_by_user_id,
            created_at: model.created_at,
        }
    }

    /// Version history for a document, newest first.
    pub async fn find_by_document<C: ConnectionTrait>(
        db: &C,
        document_id: Uuid,
    ) -> Result<Vec<Self>, DbErr> {
        let document_row_id = ids::document_id_by_uuid(db, document_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Document not found".to_string()))?;
        let models = document_version::Entity::find()
            .filter(document_version::Column::DocumentId.eq(document_row_id))
            .order_by_desc(document_version::Column::VersionNumber)
            .all(db)
            .await?;
        Ok(models
            .into_iter()
            .map(|m| Self::from_model_with(m, document_id))
            .collect())
    }

    /// Appends a version with the next sequential number. The read of the
    /// current maximum and the insert run in one transaction, and the unique
    /// index on `(document_id, version_number)` rejects any raced duplicate.
    pub async fn create<C>(
        db: &C,
        document_id: Uuid,
        data: &CreateDocumentVersion,
        created_by_user_id: Uuid,
        id: Uuid,
    ) -> Result<Self, DbErr>
    where
        C: ConnectionTrait + TransactionTrait,
    {
        let document_row_id = ids::document_id_by_uuid(db, document_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Document not found".to_string()))?;

        let txn = db.begin().await?;

        let current_max: Option<i64> = document_version::Entity::find()
            .select_only()
            .column_as(document_version::Column::VersionNumber.max(), "max_version")
            .filter(document_version::Column::DocumentId.eq(document_row_id))
            .into_tuple::<Option<i64>>()
            .one(&txn)
            .await?
            .flatten();

        let active = document_version::ActiveModel {
            uuid: Set(id),
            document_id: Set(document_row_id),
            content: Set(data.content.clone()),
            version_number: Set(current_max.unwrap_or(0) + 1),
            created_by_user_id: Set(created_by_user_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        let model = active.insert(&txn).await?;
        txn.commit().await?;

        Ok(Self::from_model_with(model, document_id))
    }
}
