use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{entities::project_settings, models::ids};

/// One-to-one settings row for a project.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ProjectSettings {
    pub id: Uuid,
    pub project_id: Uuid,
    pub notification_enabled: bool,
    pub default_template_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UpsertProjectSettings {
    pub notification_enabled: Option<bool>,
    pub default_template_id: Option<Option<Uuid>>,
}

impl ProjectSettings {
    async fn from_model<C: ConnectionTrait>(
        db: &C,
        model: project_settings::Model,
    ) -> Result<Self, DbErr> {
        let project_uuid = ids::project_uuid_by_id(db, model.project_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Project not found".to_string()))?;
        let template_uuid = match model.default_template_id {
            Some(id) => ids::template_uuid_by_id(db, id).await?,
            None => None,
        };
        Ok(Self {
            id: model.uuid,
            project_id: project_uuid,
            notification_enabled: model.notification_enabled,
            default_template_id: template_uuid,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }

    pub async fn find_by_project<C: ConnectionTrait>(
        db: &C,
        project_id: Uuid,
    ) -> Result<Option<Self>, DbErr> {
        let project_row_id = ids::project_id_by_uuid(db, project_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Project not found".to_string()))?;
        let record = project_settings::Entity::find()
            .filter(project_settings::Column::ProjectId.eq(project_row_id))
            .one(db)
            .await?;
        match record {
            Some(model) => Ok(Some(Self::from_model(db, model).await?)),
            None => Ok(None),
        }
    }

    /// Settings for a batch of projects, keyed by project row id. Two
    /// queries regardless of batch size.
    pub(crate) async fn find_by_project_row_ids<C: ConnectionTrait>(
        db: &C,
        project_row_ids: &[i64],
    ) -> Result<HashMap<i64, Self>, DbErr> {
        if project_row_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let models = project_settings::Entity::find()
            .filter(project_settings::Column::ProjectId.is_in(project_row_ids.iter().copied()))
            .all(db)
            .await?;

        let project_uuids = ids::project_uuid_map(db, project_row_ids).await?;
        let template_ids: Vec<i64> = models.iter().filter_map(|m| m.default_template_id).collect();
        let template_uuids = ids::template_uuid_map(db, &template_ids).await?;

        let mut out = HashMap::new();
        for model in models {
            let Some(project_uuid) = project_uuids.get(&model.project_id).copied() else {
                continue;
            };
            let template_uuid = model
                .default_template_id
                .and_then(|id| template_uuids.get(&id).copied());
            out.insert(
                model.project_id,
                Self {
                    id: model.uuid,
                    project_id: project_uuid,
                    notification_enabled: model.notification_enabled,
                    default_template_id: template_uuid,
                    created_at: model.created_at,
                    updated_at: model.updated_at,
                },
            );
        }
        Ok(out)
    }

    /// Creates the settings row on first write, updates it afterwards. The
    /// unique index on `project_id` keeps the relation one-to-one.
    pub async fn upsert<C: ConnectionTrait>(
        db: &C,
        project_id: Uuid,
        data: &UpsertProjectSettings,
    ) -> Result<Self, DbErr> {
        let project_row_id = ids::project_id_by_uuid(db, project_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Project not found".to_string()))?;

        let template_row_id = match data.default_template_id {
            Some(Some(template_uuid)) => Some(Some(
                ids::template_id_by_uuid(db, template_uuid)
                    .await?
                    .ok_or(DbErr::RecordNotFound("Template not found".to_string()))?,
            )),
            Some(None) => Some(None),
            None => None,
        };

        let existing = project_settings::Entity::find()
            .filter(project_settings::Column::ProjectId.eq(project_row_id))
            .one(db)
            .await?;

        let now = Utc::now();
        let model = match existing {
            Some(record) => {
                let mut active: project_settings::ActiveModel = record.into();
                if let Some(enabled) = data.notification_enabled {
                    active.notification_enabled = Set(enabled);
                }
                if let Some(template) = template_row_id {
                    active.default_template_id = Set(template);
                }
                active.updated_at = Set(now);
                active.update(db).await?
            }
            None => {
                let active = project_settings::ActiveModel {
                    uuid: Set(Uuid::new_v4()),
                    project_id: Set(project_row_id),
                    notification_enabled: Set(data.notification_enabled.unwrap_or(true)),
                    default_template_id: Set(template_row_id.flatten()),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                };
                active.insert(db).await?
            }
        };
        Self::from_model(db, model).await
    }
}
