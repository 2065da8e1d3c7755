use db_migration::Migrator;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use utils::assets::asset_dir;

pub mod entities;
pub mod fetch_plan;
pub mod models;
pub mod types;

pub use sea_orm::{DbErr, SqlErr, TransactionTrait};

#[derive(Clone)]
pub struct DBService {
    pub conn: DatabaseConnection,
}

impl DBService {
    /// Connects to `DATABASE_URL` if set, otherwise to a sqlite file under
    /// the asset directory, and runs pending migrations.
    pub async fn new() -> Result<DBService, DbErr> {
        let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| {
            format!(
                "sqlite://{}?mode=rwc",
                asset_dir().join("db.sqlite").to_string_lossy()
            )
        });
        Self::from_url(&database_url).await
    }

    pub async fn from_url(database_url: &str) -> Result<DBService, DbErr> {
        let mut options = ConnectOptions::new(database_url.to_string());
        options.max_connections(5).sqlx_logging(false);
        let conn = Database::connect(options).await?;
        Migrator::up(&conn, None).await?;
        Ok(DBService { conn })
    }

    /// A private in-memory database, for tests. The pool is capped at one
    /// connection so every statement sees the same sqlite memory instance.
    pub async fn new_in_memory() -> Result<DBService, DbErr> {
        let mut options = ConnectOptions::new("sqlite::memory:".to_string());
        options.max_connections(1).sqlx_logging(false);
        let conn = Database::connect(options).await?;
        Migrator::up(&conn, None).await?;
        Ok(DBService { conn })
    }
}
