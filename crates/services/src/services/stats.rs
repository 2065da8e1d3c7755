use db::{
    DBService, DbErr,
    models::{
        project::{Project, ProjectWithStats},
        task::{Task, TaskFilter, TaskWithStats},
        topic::{Topic, TopicWithStats},
    },
};
use uuid::Uuid;

use crate::services::cache::{CacheKey, ResultCache};

/// Read-side aggregation over the store, memoized through [`ResultCache`].
/// Every method issues a bounded number of grouped queries on a miss and
/// serves repeat calls from the cache until the TTL lapses. All queries
/// share the cache's env-configured default TTL.
#[derive(Clone)]
pub struct StatsService {
    db: DBService,
    cache: ResultCache,
}

impl StatsService {
    pub fn new(db: DBService, cache: ResultCache) -> Self {
        Self { db, cache }
    }

    pub async fn topics_with_stats(&self) -> Result<Vec<TopicWithStats>, DbErr> {
        self.cache
            .get_or_compute(
                CacheKey::new("topics_with_stats", &[]),
                self.cache.default_ttl(),
                || async { Topic::find_all_with_stats(&self.db.conn).await },
            )
            .await
    }

    pub async fn active_topics(&self) -> Result<Vec<TopicWithStats>, DbErr> {
        self.cache
            .get_or_compute(
                CacheKey::new("active_topics", &[]),
                self.cache.default_ttl(),
                || async { Topic::find_active(&self.db.conn).await },
            )
            .await
    }

    pub async fn projects_with_stats(
        &self,
        topic_id: Option<Uuid>,
    ) -> Result<Vec<ProjectWithStats>, DbErr> {
        let scope = topic_id.map(|id| id.to_string()).unwrap_or_default();
        let key = CacheKey::new("projects_with_stats", &[&scope]);
        self.cache
            .get_or_compute(
                key,
                self.cache.default_ttl(),
                || async { Project::find_all_with_stats(&self.db.conn, topic_id).await },
            )
            .await
    }

    pub async fn tasks_with_stats(
        &self,
        filter: &TaskFilter,
    ) -> Result<Vec<TaskWithStats>, DbErr> {
        let project = filter.project_id.map(|id| id.to_string()).unwrap_or_default();
        let status = filter
            .status
            .map(|s| s.to_string())
            .unwrap_or_default();
        let key = CacheKey::new(
            "tasks_with_stats",
            &[&project, &status, &filter.active_only, &filter.overdue],
        );
        self.cache
            .get_or_compute(
                key,
                self.cache.default_ttl(),
                || async { Task::find_all_with_stats(&self.db.conn, filter).await },
            )
            .await
    }
}
