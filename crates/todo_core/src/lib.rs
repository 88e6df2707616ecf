//! Core domain logic for the todo app: task storage and theme/icon preferences.
//! This crate is the single source of truth for business invariants; display
//! layers only call into the stores and subscribe to their change events.

pub mod app;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod observer;
pub mod repo;
pub mod service;

pub use app::{open_app, App, AppError, SqlitePreferenceStore, SqliteTaskStore};
pub use config::CoreConfig;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::color::{colorize, AccentColor};
pub use model::task::{Priority, Task, TaskId, TaskValidationError};
pub use model::theme::{default_theme, find_theme, list_themes, Theme};
pub use observer::SubscriptionId;
pub use repo::preference_repo::{PreferenceRepository, SqlitePreferenceRepository};
pub use repo::task_repo::{RepoError, RepoResult, SqliteTaskRepository, TaskRepository};
pub use service::error::{StoreError, StoreResult, ValidationError};
pub use service::icon::{IconApplyError, IconApplyOutcome, IconProvider, StaticIconProvider};
pub use service::preference_store::{PreferenceEvent, PreferenceStore};
pub use service::task_store::{TaskEvent, TaskStore};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
