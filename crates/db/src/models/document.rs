use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{
    entities::{document, document_version},
    fetch_plan::{DOCUMENT_WITH_VERSIONS, FetchPlan, FetchPlanError},
    models::{document_version::DocumentVersion, ids},
};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Document {
    pub id: Uuid,
    pub project_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateDocument {
    pub project_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    pub title: String,
    pub content: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, TS)]
pub struct UpdateDocument {
    pub title: Option<String>,
    pub content: Option<String>,
}

/// List-endpoint filters, combinable.
#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct DocumentFilter {
    pub project_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
}

/// Result of executing [`DOCUMENT_WITH_VERSIONS`].
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct DocumentWithVersions {
    #[serde(flatten)]
    #[ts(flatten)]
    pub document: Document,
    pub versions: Vec<DocumentVersion>,
}

impl std::ops::Deref for DocumentWithVersions {
    type Target = Document;
    fn deref(&self) -> &Self::Target {
        &self.document
    }
}

impl Document {
    pub(crate) fn from_model_with(
        model: document::Model,
        project_uuid: Option<Uuid>,
        task_uuid: Option<Uuid>,
    ) -> Self {
        Self {
            id: model.uuid,
            project_id: project_uuid,
            task_id: task_uuid,
            title: model.title,
            content: model.content,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }

    async fn from_model<C: ConnectionTrait>(db: &C, model: document::Model) -> Result<Self, DbErr> {
        let project_uuid = match model.project_id {
            Some(id) => ids::project_uuid_by_id(db, id).await?,
            None => None,
        };
        let task_uuid = match model.task_id {
            Some(id) => ids::task_uuid_by_id(db, id).await?,
            None => None,
        };
        Ok(Self::from_model_with(model, project_uuid, task_uuid))
    }

    async fn from_models<C: ConnectionTrait>(
        db: &C,
        models: Vec<document::Model>,
    ) -> Result<Vec<Self>, DbErr> {
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

    pub async fn find_all<C: ConnectionTrait>(
        db: &C,
        filter: &DocumentFilter,
    ) -> Result<Vec<Self>, DbErr> {
        let models = Self::filtered(db, filter).await?;
        Self::from_models(db, models).await
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = document::Entity::find()
            .filter(document::Column::Uuid.eq(id))
            .one(db)
            .await?;
        match record {
            Some(model) => Ok(Some(Self::from_model(db, model).await?)),
            None => Ok(None),
        }
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateDocument,
        id: Uuid,
    ) -> Result<Self, DbErr> {
        let project_row_id = match data.project_id {
            Some(uuid) => Some(
                ids::project_id_by_uuid(db, uuid)
                    .await?
                    .ok_or(DbErr::RecordNotFound("Project not found".to_string()))?,
            ),
            None => None,
        };
        let task_row_id = match data.task_id {
            Some(uuid) => Some(
                ids::task_id_by_uuid(db, uuid)
                    .await?
                    .ok_or(DbErr::RecordNotFound("Task not found".to_string()))?,
            ),
            None => None,
        };

        let now = Utc::now();
        let active = document::ActiveModel {
            uuid: Set(id),
            project_id: Set(project_row_id),
            task_id: Set(task_row_id),
            title: Set(data.title.clone()),
            content: Set(data.content.clone().unwrap_or_default()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model_with(model, data.project_id, data.task_id))
    }

    pub async fn update<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        data: &UpdateDocument,
    ) -> Result<Self, DbErr> {
        let record = document::Entity::find()
            .filter(document::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound("Document not found".to_string()))?;

        let mut active: document::ActiveModel = record.into();
        if let Some(title) = &data.title {
            active.title = Set(title.clone());
        }
        if let Some(content) = &data.content {
            active.content = Set(content.clone());
        }
        active.updated_at = Set(Utc::now());
        let model = active.update(db).await?;
        Self::from_model(db, model).await
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
        let result = document::Entity::delete_many()
            .filter(document::Column::Uuid.eq(id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Executes a document fetch plan. Version history loads in one grouped
    /// query for the whole result set, newest version first.
    pub async fn find_with_plan<C: ConnectionTrait>(
        db: &C,
        filter: &DocumentFilter,
        plan: &FetchPlan,
    ) -> Result<Vec<DocumentWithVersions>, FetchPlanError> {
        plan.validate()?;

        let models = Self::filtered(db, filter).await?;
        let row_ids: Vec<i64> = models.iter().map(|m| m.id).collect();

        let mut versions: HashMap<i64, Vec<DocumentVersion>> = HashMap::new();
        if plan.includes("versions") {
            let doc_uuids: HashMap<i64, Uuid> = models.iter().map(|m| (m.id, m.uuid)).collect();
            for model in document_version::Entity::find()
                .filter(document_version::Column::DocumentId.is_in(row_ids.iter().copied()))
                .order_by_desc(document_version::Column::VersionNumber)
                .all(db)
                .await?
            {
                if let Some(doc_uuid) = doc_uuids.get(&model.document_id).copied() {
                    versions
                        .entry(model.document_id)
                        .or_default()
                        .push(DocumentVersion::from_model_with(model, doc_uuid));
                }
            }
        }

        let documents = Self::from_models(db, models).await?;
        Ok(row_ids
            .into_iter()
            .zip(documents)
            .map(|(row_id, document)| DocumentWithVersions {
                document,
                versions: versions.remove(&row_id).unwrap_or_default(),
            })
            .collect())
    }

    pub async fn find_with_versions<C: ConnectionTrait>(
        db: &C,
        filter: &DocumentFilter,
    ) -> Result<Vec<DocumentWithVersions>, FetchPlanError> {
        Self::find_with_plan(db, filter, &DOCUMENT_WITH_VERSIONS).await
    }

    async fn filtered<C: ConnectionTrait>(
        db: &C,
        filter: &DocumentFilter,
    ) -> Result<Vec<document::Model>, DbErr> {
        let mut query = document::Entity::find().order_by_desc(document::Column::CreatedAt);
        if let Some(project_uuid) = filter.project_id {
            let project_row_id = ids::project_id_by_uuid(db, project_uuid)
                .await?
                .ok_or(DbErr::RecordNotFound("Project not found".to_string()))?;
            query = query.filter(document::Column::ProjectId.eq(project_row_id));
        }
        if let Some(task_uuid) = filter.task_id {
            let task_row_id = ids::task_id_by_uuid(db, task_uuid)
                .await?
                .ok_or(DbErr::RecordNotFound("Task not found".to_string()))?;
            query = query.filter(document::Column::TaskId.eq(task_row_id));
        }
        query.all(db).await
    }
}
