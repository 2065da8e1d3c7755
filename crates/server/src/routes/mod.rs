pub mod comments;
pub mod documents;
pub mod favorites;
pub mod health;
pub mod projects;
pub mod subtasks;
pub mod tasks;
pub mod templates;
pub mod topics;
