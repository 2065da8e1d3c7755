pub mod comment;
pub mod document;
pub mod document_version;
pub mod favorite;
pub mod project;
pub mod project_settings;
pub mod subtask;
pub mod task;
pub mod task_detail;
pub mod template;
pub mod topic;
