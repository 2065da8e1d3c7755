pub mod cache;
pub mod classifier;
pub mod stats;

pub use cache::ResultCache;
pub use classifier::{ClassifierError, DocumentClassifier, ServingClassifier, StaticClassifier};
pub use stats::StatsService;
