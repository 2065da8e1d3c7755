use std::collections::HashMap;

use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QuerySelect};
use uuid::Uuid;

use crate::entities::{document, project, subtask, task, template, topic};

macro_rules! id_lookups {
    ($by_uuid:ident, $by_id:ident, $map_fn:ident, $entity:ident) => {
        pub async fn $by_uuid<C: ConnectionTrait>(
            db: &C,
            uuid: Uuid,
        ) -> Result<Option<i64>, DbErr> {
            $entity::Entity::find()
                .select_only()
                .column($entity::Column::Id)
                .filter($entity::Column::Uuid.eq(uuid))
                .into_tuple()
                .one(db)
                .await
        }

        pub async fn $by_id<C: ConnectionTrait>(
            db: &C,
            id: i64,
        ) -> Result<Option<Uuid>, DbErr> {
            $entity::Entity::find()
                .select_only()
                .column($entity::Column::Uuid)
                .filter($entity::Column::Id.eq(id))
                .into_tuple()
                .one(db)
                .await
        }

        /// Row-id → uuid map for a batch of rows, one query.
        pub async fn $map_fn<C: ConnectionTrait>(
            db: &C,
            ids: &[i64],
        ) -> Result<HashMap<i64, Uuid>, DbErr> {
            if ids.is_empty() {
                return Ok(HashMap::new());
            }
            let rows: Vec<(i64, Uuid)> = $entity::Entity::find()
                .select_only()
                .column($entity::Column::Id)
                .column($entity::Column::Uuid)
                .filter($entity::Column::Id.is_in(ids.iter().copied()))
                .into_tuple()
                .all(db)
                .await?;
            Ok(rows.into_iter().collect())
        }
    };
}

id_lookups!(topic_id_by_uuid, topic_uuid_by_id, topic_uuid_map, topic);
id_lookups!(project_id_by_uuid, project_uuid_by_id, project_uuid_map, project);
id_lookups!(task_id_by_uuid, task_uuid_by_id, task_uuid_map, task);
id_lookups!(subtask_id_by_uuid, subtask_uuid_by_id, subtask_uuid_map, subtask);
id_lookups!(document_id_by_uuid, document_uuid_by_id, document_uuid_map, document);
id_lookups!(template_id_by_uuid, template_uuid_by_id, template_uuid_map, template);
