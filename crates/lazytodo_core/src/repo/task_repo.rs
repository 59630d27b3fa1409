//! Task repository over a `KeyValueStore`.
//!
//! # Responsibility
//! - Load and persist the whole task list as one JSON document.
//! - Apply add/toggle/delete and persist the result.
//!
//! # Invariants
//! - The list lives under `TASKS_STORAGE_KEY` as a JSON array of
//!   `{id, text, completed}` in insertion order.
//! - Blank text never produces a task and never triggers a persist.
//! - Toggle/delete of an unknown id return the list unchanged.
//! - Loaded lists have unique ids; later duplicates are re-keyed, not dropped.
//! - Mutations issue exactly one persist; its failure is logged only.

use crate::model::task::{is_blank_text, Task, TaskId, TaskList};
use crate::repo::task_ids::{Clock, TaskIdGenerator};
use crate::store::{KeyValueStore, StoreError};
use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage slot holding the serialized task list.
pub const TASKS_STORAGE_KEY: &str = "tasks";

/// Persisted list could not be read.
#[derive(Debug)]
pub enum LoadError {
    Store(StoreError),
    Corrupt(String),
}

impl Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "failed to read task list: {err}"),
            Self::Corrupt(message) => write!(f, "persisted task list is corrupt: {message}"),
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Corrupt(_) => None,
        }
    }
}

/// Task list could not be written.
#[derive(Debug)]
pub enum PersistError {
    Encode(String),
    Store(StoreError),
}

impl Display for PersistError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encode(message) => write!(f, "failed to encode task list: {message}"),
            Self::Store(err) => write!(f, "failed to write task list: {err}"),
        }
    }
}

impl Error for PersistError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Encode(_) => None,
        }
    }
}

/// Canonical load/mutate/persist logic for the task list.
pub struct TaskRepository<S: KeyValueStore> {
    store: S,
    ids: TaskIdGenerator,
}

impl<S: KeyValueStore> TaskRepository<S> {
    /// Creates a repository using the system clock for ids.
    pub fn new(store: S) -> Self {
        Self {
            store,
            ids: TaskIdGenerator::default(),
        }
    }

    /// Creates a repository with a caller-provided id clock.
    pub fn with_clock(store: S, clock: impl Clock + Send + 'static) -> Self {
        Self {
            store,
            ids: TaskIdGenerator::new(clock),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reads the persisted list.
    ///
    /// A missing (or empty) slot is an empty list, not an error.
    ///
    /// # Errors
    /// - `LoadError::Store` when the backend read fails.
    /// - `LoadError::Corrupt` when the value is not a valid task array.
    pub fn load(&self) -> Result<TaskList, LoadError> {
        let raw = self
            .store
            .get(TASKS_STORAGE_KEY)
            .map_err(LoadError::Store)?;
        let mut tasks = match raw {
            Some(raw) if !raw.trim().is_empty() => decode_task_list(&raw)?,
            _ => TaskList::new(),
        };
        self.rekey_duplicates(&mut tasks);
        info!(
            "event=tasks_load module=repo status=ok count={}",
            tasks.len()
        );
        Ok(tasks)
    }

    /// `load()` with failures logged and replaced by an empty list.
    pub fn load_or_empty(&self) -> TaskList {
        self.load().unwrap_or_else(|err| {
            error!("event=tasks_load module=repo status=error fallback=empty error={err}");
            TaskList::new()
        })
    }

    /// Appends a new open task unless `text` is blank.
    pub fn add(&self, mut list: TaskList, text: &str) -> TaskList {
        if is_blank_text(text) {
            debug!("event=task_add module=repo status=skip reason=blank_text");
            return list;
        }

        let id = self.ids.next_id(&list);
        match Task::new(id, text) {
            Ok(task) => {
                debug!("event=task_add module=repo status=ok id={}", task.id);
                list.push(task);
            }
            Err(err) => {
                warn!("event=task_add module=repo status=skip error={err}");
                return list;
            }
        }
        self.persist_logged(&list);
        list
    }

    /// Flips `completed` on the task with `id`.
    pub fn toggle_completion(&self, mut list: TaskList, id: &TaskId) -> TaskList {
        match list.iter_mut().find(|task| &task.id == id) {
            Some(task) => {
                task.toggle();
                debug!(
                    "event=task_toggle module=repo status=ok id={id} completed={}",
                    task.completed
                );
            }
            None => debug!("event=task_toggle module=repo status=skip reason=not_found id={id}"),
        }
        self.persist_logged(&list);
        list
    }

    /// Removes the task with `id`, keeping the order of the rest.
    pub fn delete(&self, mut list: TaskList, id: &TaskId) -> TaskList {
        let before = list.len();
        list.retain(|task| &task.id != id);
        if list.len() == before {
            debug!("event=task_delete module=repo status=skip reason=not_found id={id}");
        } else {
            debug!("event=task_delete module=repo status=ok id={id}");
        }
        self.persist_logged(&list);
        list
    }

    /// Writes the full list under `TASKS_STORAGE_KEY`.
    pub fn persist(&self, list: &[Task]) -> Result<(), PersistError> {
        let encoded =
            serde_json::to_string(list).map_err(|err| PersistError::Encode(err.to_string()))?;
        self.store
            .set(TASKS_STORAGE_KEY, &encoded)
            .map_err(PersistError::Store)
    }

    // Every record is kept; a repeated id gets a fresh one in memory and is
    // written back under it by the next persist.
    fn rekey_duplicates(&self, tasks: &mut TaskList) {
        let mut seen = HashSet::with_capacity(tasks.len());
        for index in 0..tasks.len() {
            if seen.insert(tasks[index].id.clone()) {
                continue;
            }
            let fresh = self.ids.next_id(tasks);
            warn!(
                "event=tasks_load module=repo status=warn reason=duplicate_id id={} rekeyed_to={fresh}",
                tasks[index].id
            );
            seen.insert(fresh.clone());
            tasks[index].id = fresh;
        }
    }

    fn persist_logged(&self, list: &[Task]) {
        match self.persist(list) {
            Ok(()) => debug!(
                "event=tasks_persist module=repo status=ok count={}",
                list.len()
            ),
            Err(err) => error!(
                "event=tasks_persist module=repo status=error count={} error={err}",
                list.len()
            ),
        }
    }
}

fn decode_task_list(raw: &str) -> Result<TaskList, LoadError> {
    serde_json::from_str(raw).map_err(|err| LoadError::Corrupt(err.to_string()))
}
