use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseBackend;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(Topics::Table)
                    .col(pk_id_col(manager, Topics::Id))
                    .col(uuid_col(Topics::Uuid))
                    .col(ColumnDef::new(Topics::Name).string().not_null())
                    .col(text_col(Topics::Description))
                    .col(timestamp_col(Topics::CreatedAt))
                    .col(timestamp_col(Topics::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_topics_uuid")
                    .table(Topics::Table)
                    .col(Topics::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(Projects::Table)
                    .col(pk_id_col(manager, Projects::Id))
                    .col(uuid_col(Projects::Uuid))
                    .col(ColumnDef::new(Projects::TopicId).big_integer().not_null())
                    .col(ColumnDef::new(Projects::Name).string().not_null())
                    .col(text_col(Projects::Description))
                    .col(timestamp_col(Projects::CreatedAt))
                    .col(timestamp_col(Projects::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_projects_topic_id")
                            .from(Projects::Table, Projects::TopicId)
                            .to(Topics::Table, Topics::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_projects_uuid")
                    .table(Projects::Table)
                    .col(Projects::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_projects_topic_id")
                    .table(Projects::Table)
                    .col(Projects::TopicId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(Templates::Table)
                    .col(pk_id_col(manager, Templates::Id))
                    .col(uuid_col(Templates::Uuid))
                    .col(ColumnDef::new(Templates::TopicId).big_integer().not_null())
                    .col(ColumnDef::new(Templates::Name).string().not_null())
                    .col(text_col(Templates::Content))
                    .col(timestamp_col(Templates::CreatedAt))
                    .col(timestamp_col(Templates::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_templates_topic_id")
                            .from(Templates::Table, Templates::TopicId)
                            .to(Topics::Table, Topics::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_templates_uuid")
                    .table(Templates::Table)
                    .col(Templates::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(ProjectSettings::Table)
                    .col(pk_id_col(manager, ProjectSettings::Id))
                    .col(uuid_col(ProjectSettings::Uuid))
                    .col(
                        ColumnDef::new(ProjectSettings::ProjectId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProjectSettings::NotificationEnabled)
                            .boolean()
                            .not_null()
                            .default(Expr::val(true)),
                    )
                    .col(ColumnDef::new(ProjectSettings::DefaultTemplateId).big_integer())
                    .col(timestamp_col(ProjectSettings::CreatedAt))
                    .col(timestamp_col(ProjectSettings::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_settings_project_id")
                            .from(ProjectSettings::Table, ProjectSettings::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_settings_default_template_id")
                            .from(ProjectSettings::Table, ProjectSettings::DefaultTemplateId)
                            .to(Templates::Table, Templates::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_project_settings_uuid")
                    .table(ProjectSettings::Table)
                    .col(ProjectSettings::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_project_settings_project_id")
                    .table(ProjectSettings::Table)
                    .col(ProjectSettings::ProjectId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(Tasks::Table)
                    .col(pk_id_col(manager, Tasks::Id))
                    .col(uuid_col(Tasks::Uuid))
                    .col(ColumnDef::new(Tasks::ProjectId).big_integer().not_null())
                    .col(ColumnDef::new(Tasks::Title).string().not_null())
                    .col(text_col(Tasks::Description))
                    .col(
                        ColumnDef::new(Tasks::Status)
                            .string_len(32)
                            .not_null()
                            .default(Expr::val("new")),
                    )
                    .col(uuid_nullable_col(Tasks::AssigneeUserId))
                    .col(timestamp_col(Tasks::CreatedAt))
                    .col(timestamp_col(Tasks::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tasks_project_id")
                            .from(Tasks::Table, Tasks::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_tasks_uuid")
                    .table(Tasks::Table)
                    .col(Tasks::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_tasks_project_id")
                    .table(Tasks::Table)
                    .col(Tasks::ProjectId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_tasks_status")
                    .table(Tasks::Table)
                    .col(Tasks::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(TaskDetails::Table)
                    .col(pk_id_col(manager, TaskDetails::Id))
                    .col(uuid_col(TaskDetails::Uuid))
                    .col(ColumnDef::new(TaskDetails::TaskId).big_integer().not_null())
                    .col(text_col(TaskDetails::Requirements))
                    .col(text_col(TaskDetails::AcceptanceCriteria))
                    .col(timestamp_col(TaskDetails::CreatedAt))
                    .col(timestamp_col(TaskDetails::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_task_details_task_id")
                            .from(TaskDetails::Table, TaskDetails::TaskId)
                            .to(Tasks::Table, Tasks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_task_details_uuid")
                    .table(TaskDetails::Table)
                    .col(TaskDetails::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_task_details_task_id")
                    .table(TaskDetails::Table)
                    .col(TaskDetails::TaskId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(Subtasks::Table)
                    .col(pk_id_col(manager, Subtasks::Id))
                    .col(uuid_col(Subtasks::Uuid))
                    .col(ColumnDef::new(Subtasks::TaskId).big_integer().not_null())
                    .col(ColumnDef::new(Subtasks::Title).string().not_null())
                    .col(text_col(Subtasks::Description))
                    .col(
                        ColumnDef::new(Subtasks::Status)
                            .string_len(32)
                            .not_null()
                            .default(Expr::val("new")),
                    )
                    .col(timestamp_col(Subtasks::CreatedAt))
                    .col(timestamp_col(Subtasks::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_subtasks_task_id")
                            .from(Subtasks::Table, Subtasks::TaskId)
                            .to(Tasks::Table, Tasks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_subtasks_uuid")
                    .table(Subtasks::Table)
                    .col(Subtasks::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_subtasks_task_id")
                    .table(Subtasks::Table)
                    .col(Subtasks::TaskId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(Comments::Table)
                    .col(pk_id_col(manager, Comments::Id))
                    .col(uuid_col(Comments::Uuid))
                    .col(ColumnDef::new(Comments::TaskId).big_integer())
                    .col(ColumnDef::new(Comments::SubtaskId).big_integer())
                    .col(text_col(Comments::Content))
                    .col(uuid_col(Comments::AuthorUserId))
                    .col(timestamp_col(Comments::CreatedAt))
                    .col(timestamp_col(Comments::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comments_task_id")
                            .from(Comments::Table, Comments::TaskId)
                            .to(Tasks::Table, Tasks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comments_subtask_id")
                            .from(Comments::Table, Comments::SubtaskId)
                            .to(Subtasks::Table, Subtasks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_comments_uuid")
                    .table(Comments::Table)
                    .col(Comments::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_comments_task_id")
                    .table(Comments::Table)
                    .col(Comments::TaskId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_comments_subtask_id")
                    .table(Comments::Table)
                    .col(Comments::SubtaskId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(Documents::Table)
                    .col(pk_id_col(manager, Documents::Id))
                    .col(uuid_col(Documents::Uuid))
                    .col(ColumnDef::new(Documents::ProjectId).big_integer())
                    .col(ColumnDef::new(Documents::TaskId).big_integer())
                    .col(ColumnDef::new(Documents::Title).string().not_null())
                    .col(text_col(Documents::Content))
                    .col(timestamp_col(Documents::CreatedAt))
                    .col(timestamp_col(Documents::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_documents_project_id")
                            .from(Documents::Table, Documents::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_documents_task_id")
                            .from(Documents::Table, Documents::TaskId)
                            .to(Tasks::Table, Tasks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_documents_uuid")
                    .table(Documents::Table)
                    .col(Documents::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_documents_project_id")
                    .table(Documents::Table)
                    .col(Documents::ProjectId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_documents_task_id")
                    .table(Documents::Table)
                    .col(Documents::TaskId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(DocumentVersions::Table)
                    .col(pk_id_col(manager, DocumentVersions::Id))
                    .col(uuid_col(DocumentVersions::Uuid))
                    .col(
                        ColumnDef::new(DocumentVersions::DocumentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(text_col(DocumentVersions::Content))
                    .col(
                        ColumnDef::new(DocumentVersions::VersionNumber)
                            .big_integer()
                            .not_null(),
                    )
                    .col(uuid_col(DocumentVersions::CreatedByUserId))
                    .col(timestamp_col(DocumentVersions::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_document_versions_document_id")
                            .from(DocumentVersions::Table, DocumentVersions::DocumentId)
                            .to(Documents::Table, Documents::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_document_versions_uuid")
                    .table(DocumentVersions::Table)
                    .col(DocumentVersions::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_document_versions_document_id_version_number")
                    .table(DocumentVersions::Table)
                    .col(DocumentVersions::DocumentId)
                    .col(DocumentVersions::VersionNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(Favorites::Table)
                    .col(pk_id_col(manager, Favorites::Id))
                    .col(uuid_col(Favorites::Uuid))
                    .col(uuid_col(Favorites::UserId))
                    .col(ColumnDef::new(Favorites::ProjectId).big_integer())
                    .col(ColumnDef::new(Favorites::TaskId).big_integer())
                    .col(timestamp_col(Favorites::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_favorites_project_id")
                            .from(Favorites::Table, Favorites::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_favorites_task_id")
                            .from(Favorites::Table, Favorites::TaskId)
                            .to(Tasks::Table, Tasks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_favorites_uuid")
                    .table(Favorites::Table)
                    .col(Favorites::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_favorites_user_id_project_id")
                    .table(Favorites::Table)
                    .col(Favorites::UserId)
                    .col(Favorites::ProjectId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_favorites_user_id_task_id")
                    .table(Favorites::Table)
                    .col(Favorites::UserId)
                    .col(Favorites::TaskId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            Favorites::Table.into_iden(),
            DocumentVersions::Table.into_iden(),
            Documents::Table.into_iden(),
            Comments::Table.into_iden(),
            Subtasks::Table.into_iden(),
            TaskDetails::Table.into_iden(),
            Tasks::Table.into_iden(),
            ProjectSettings::Table.into_iden(),
            Templates::Table.into_iden(),
            Projects::Table.into_iden(),
            Topics::Table.into_iden(),
        ] {
            manager
                .drop_table(Table::drop().if_exists().table(table).to_owned())
                .await?;
        }
        Ok(())
    }
}

fn pk_id_col<T: Iden>(manager: &SchemaManager, col: T) -> ColumnDef {
    let mut col = ColumnDef::new(col);
    match manager.get_database_backend() {
        DatabaseBackend::Sqlite => {
            col.integer();
        }
        _ => {
            col.big_integer();
        }
    }
    col.not_null().auto_increment().primary_key().to_owned()
}

fn uuid_col<T: Iden>(col: T) -> ColumnDef {
    ColumnDef::new(col).uuid().not_null().to_owned()
}

fn uuid_nullable_col<T: Iden>(col: T) -> ColumnDef {
    ColumnDef::new(col).uuid().to_owned()
}

fn text_col<T: Iden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .text()
        .not_null()
        .default(Expr::val(""))
        .to_owned()
}

fn timestamp_col<T: Iden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

#[derive(Iden)]
enum Topics {
    Table,
    Id,
    Uuid,
    Name,
    Description,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Projects {
    Table,
    Id,
    Uuid,
    TopicId,
    Name,
    Description,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Templates {
    Table,
    Id,
    Uuid,
    TopicId,
    Name,
    Content,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum ProjectSettings {
    Table,
    Id,
    Uuid,
    ProjectId,
    NotificationEnabled,
    DefaultTemplateId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Tasks {
    Table,
    Id,
    Uuid,
    ProjectId,
    Title,
    Description,
    Status,
    AssigneeUserId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum TaskDetails {
    Table,
    Id,
    Uuid,
    TaskId,
    Requirements,
    AcceptanceCriteria,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Subtasks {
    Table,
    Id,
    Uuid,
    TaskId,
    Title,
    Description,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Comments {
    Table,
    Id,
    Uuid,
    TaskId,
    SubtaskId,
    Content,
    AuthorUserId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Documents {
    Table,
    Id,
    Uuid,
    ProjectId,
    TaskId,
    Title,
    Content,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum DocumentVersions {
    Table,
    Id,
    Uuid,
    DocumentId,
    Content,
    VersionNumber,
    CreatedByUserId,
    CreatedAt,
}

#[derive(Iden)]
enum Favorites {
    Table,
    Id,
    Uuid,
    UserId,
    ProjectId,
    TaskId,
    CreatedAt,
}
