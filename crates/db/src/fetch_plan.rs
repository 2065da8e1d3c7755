//! Declarative fetch plans.
//!
//! A plan is pure data: the root entity plus the relation paths to load with
//! it. `eager` paths are loaded alongside the root rows; `batched` paths are
//! loaded with one grouped query per relation across the whole result set,
//! never one query per row. Plans can be validated without touching the
//! store, and an executed plan issues at most `1 + eager + batched` queries.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlanRoot {
    Task,
    Project,
    Document,
}

impl PlanRoot {
    pub fn known_relations(&self) -> &'static [&'static str] {
        match self {
            PlanRoot::Task => &[
                "project",
                "project.topic",
                "detail",
                "subtasks",
                "comments",
                "documents",
            ],
            PlanRoot::Project => &["topic", "settings", "tasks", "documents"],
            PlanRoot::Document => &["versions"],
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchPlanError {
    #[error("unknown relation '{path}' for {root:?}")]
    UnknownRelation { root: PlanRoot, path: String },
    #[error("relation '{path}' requires '{prefix}' to be fetched as well")]
    MissingPrefix { path: String, prefix: String },
    #[error(transparent)]
    Database(#[from] sea_orm::DbErr),
}

#[derive(Debug, Clone)]
pub struct FetchPlan {
    pub root: PlanRoot,
    pub eager: &'static [&'static str],
    pub batched: &'static [&'static str],
}

impl FetchPlan {
    pub const fn new(
        root: PlanRoot,
        eager: &'static [&'static str],
        batched: &'static [&'static str],
    ) -> Self {
        Self {
            root,
            eager,
            batched,
        }
    }

    pub fn paths(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.eager.iter().chain(self.batched.iter()).copied()
    }

    pub fn includes(&self, path: &str) -> bool {
        self.paths().any(|p| p == path)
    }

    /// Checks every path against the root's statically known relations, and
    /// that nested paths are preceded by their prefix.
    pub fn validate(&self) -> Result<(), FetchPlanError> {
        let known = self.root.known_relations();
        for path in self.paths() {
            if !known.contains(&path) {
                return Err(FetchPlanError::UnknownRelation {
                    root: self.root,
                    path: path.to_string(),
                });
            }
            if let Some((prefix, _)) = path.rsplit_once('.')
                && !self.includes(prefix)
            {
                return Err(FetchPlanError::MissingPrefix {
                    path: path.to_string(),
                    prefix: prefix.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Upper bound on the number of store round trips an execution may take.
    pub fn max_queries(&self) -> usize {
        1 + self.eager.len() + self.batched.len()
    }
}

/// Tasks with their project, the project's topic, and batch-loaded detail,
/// subtasks, comments and documents.
pub const TASK_WITH_RELATED: FetchPlan = FetchPlan::new(
    PlanRoot::Task,
    &["project", "project.topic"],
    &["detail", "subtasks", "comments", "documents"],
);

/// Projects with topic and settings, plus batch-loaded tasks and documents.
pub const PROJECT_WITH_RELATED: FetchPlan = FetchPlan::new(
    PlanRoot::Project,
    &["topic", "settings"],
    &["tasks", "documents"],
);

/// Documents with their full version history.
pub const DOCUMENT_WITH_VERSIONS: FetchPlan =
    FetchPlan::new(PlanRoot::Document, &[], &["versions"]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_plans_validate() {
        TASK_WITH_RELATED.validate().unwrap();
        PROJECT_WITH_RELATED.validate().unwrap();
        DOCUMENT_WITH_VERSIONS.validate().unwrap();
    }

    #[test]
    fn unknown_relation_is_rejected() {
        let plan = FetchPlan::new(PlanRoot::Document, &[], &["subtasks"]);
        assert!(matches!(
            plan.validate(),
            Err(FetchPlanError::UnknownRelation { .. })
        ));
    }

    #[test]
    fn nested_path_requires_prefix() {
        let plan = FetchPlan::new(PlanRoot::Task, &["project.topic"], &[]);
        assert!(matches!(
            plan.validate(),
            Err(FetchPlanError::MissingPrefix { .. })
        ));
    }

    #[test]
    fn query_budget_is_bounded() {
        assert_eq!(TASK_WITH_RELATED.max_queries(), 7);
        assert_eq!(DOCUMENT_WITH_VERSIONS.max_queries(), 2);
    }
}
