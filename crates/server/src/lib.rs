use std::sync::Arc;

use db::DBService;
use services::services::{
    DocumentClassifier, ResultCache, ServingClassifier, StatsService, StaticClassifier,
};

pub mod error;
pub mod http;
pub mod middleware;
pub mod routes;

#[derive(Clone)]
pub struct AppState {
    db: DBService,
    stats: StatsService,
    classifier: Arc<dyn DocumentClassifier>,
}

impl AppState {
    pub fn new(db: DBService, cache: ResultCache, classifier: Arc<dyn DocumentClassifier>) -> Self {
        let stats = StatsService::new(db.clone(), cache);
        Self {
            db,
            stats,
            classifier,
        }
    }

    /// State for a production process: env-configured cache, env-configured
    /// serving endpoint (classification disabled when unset).
    pub fn from_env(db: DBService) -> Self {
        let classifier: Arc<dyn DocumentClassifier> = match ServingClassifier::from_env() {
            Some(serving) => Arc::new(serving),
            None => {
                tracing::warn!("TB_MODEL_SERVING_URL not set, document classification disabled");
                Arc::new(StaticClassifier::unavailable())
            }
        };
        Self::new(db, ResultCache::from_env(), classifier)
    }

    pub fn db(&self) -> &DBService {
        &self.db
    }

    pub fn stats(&self) -> &StatsService {
        &self.stats
    }

    pub fn classifier(&self) -> &dyn DocumentClassifier {
        self.classifier.as_ref()
    }
}
