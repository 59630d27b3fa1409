//! Core domain logic for LazyTodo.
//! This crate is the single source of truth for task list state and its
//! persistence; the host UI only renders snapshots and forwards intents.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod screen;
pub mod service;
pub mod store;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::task::{Task, TaskId, TaskList, TaskValidationError};
pub use repo::task_ids::{Clock, SystemClock};
pub use repo::task_repo::{LoadError, PersistError, TaskRepository, TASKS_STORAGE_KEY};
pub use service::task_list_store::{ConfirmPrompt, TaskIntent, TaskListSnapshot, TaskListStore};
pub use store::{
    KeyValueStore, MemoryStore, SqliteStore, StoreError, StoreResult, WriteBehindStore,
};

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
