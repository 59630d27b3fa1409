//! Task list state container with intent dispatch.
//!
//! # Responsibility
//! - Own the canonical in-memory task list and the pending-deletion selection.
//! - Translate UI intents into repository mutations.
//! - Hand read-only snapshots to the host UI.
//!
//! # Invariants
//! - The list is loaded at most once per mount.
//! - Every dispatch replaces the list with the repository result
//!   (last writer wins in memory).
//! - `pending_deletion` only ever references a task present in the list.

use crate::model::task::{Task, TaskId, TaskList};
use crate::repo::task_repo::TaskRepository;
use crate::store::KeyValueStore;
use log::{debug, info};

pub const DELETE_PROMPT_TITLE: &str = "Delete Task";
pub const DELETE_PROMPT_BODY: &str = "Are you sure you want to delete this task?";

/// User-triggered request against the task list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskIntent {
    Add { text: String },
    Toggle { id: TaskId },
    /// Immediate delete without confirmation.
    Delete { id: TaskId },
    /// Long-press: ask for confirmation before deleting.
    SelectForDeletion { id: TaskId },
    ConfirmDeletion,
    CancelDeletion,
}

/// Title/body pair for the delete confirmation dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmPrompt {
    pub title: &'static str,
    pub body: &'static str,
}

/// Read-only view of store state for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskListSnapshot {
    pub tasks: TaskList,
    pub pending_deletion: Option<Task>,
    /// Present exactly when `pending_deletion` is.
    pub prompt: Option<ConfirmPrompt>,
}

/// Unidirectional store over a `TaskRepository`.
pub struct TaskListStore<S: KeyValueStore> {
    repo: TaskRepository<S>,
    tasks: TaskList,
    pending_deletion: Option<TaskId>,
    mounted: bool,
}

impl<S: KeyValueStore> TaskListStore<S> {
    pub fn new(repo: TaskRepository<S>) -> Self {
        Self {
            repo,
            tasks: TaskList::new(),
            pending_deletion: None,
            mounted: false,
        }
    }

    pub fn repository(&self) -> &TaskRepository<S> {
        &self.repo
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Loads the persisted list on first call; later calls keep current state.
    pub fn mount(&mut self) -> TaskListSnapshot {
        if !self.mounted {
            self.tasks = self.repo.load_or_empty();
            self.pending_deletion = None;
            self.mounted = true;
            info!(
                "event=task_list_mount module=service status=ok count={}",
                self.tasks.len()
            );
        }
        self.snapshot()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn snapshot(&self) -> TaskListSnapshot {
        let pending_deletion = self.pending_deletion.as_ref().and_then(|id| self.find(id));
        TaskListSnapshot {
            tasks: self.tasks.clone(),
            prompt: pending_deletion.as_ref().map(|_| ConfirmPrompt {
                title: DELETE_PROMPT_TITLE,
                body: DELETE_PROMPT_BODY,
            }),
            pending_deletion,
        }
    }

    /// Applies one intent and returns the resulting snapshot.
    ///
    /// Dispatching before `mount()` mounts first so a mutation never
    /// overwrites persisted tasks with an unloaded empty list.
    pub fn dispatch(&mut self, intent: TaskIntent) -> TaskListSnapshot {
        if !self.mounted {
            self.mount();
        }

        match intent {
            TaskIntent::Add { text } => {
                let current = std::mem::take(&mut self.tasks);
                self.tasks = self.repo.add(current, &text);
            }
            TaskIntent::Toggle { id } => {
                let current = std::mem::take(&mut self.tasks);
                self.tasks = self.repo.toggle_completion(current, &id);
            }
            TaskIntent::Delete { id } => self.delete(&id),
            TaskIntent::SelectForDeletion { id } => {
                if self.find(&id).is_some() {
                    self.pending_deletion = Some(id);
                } else {
                    debug!("event=task_select module=service status=skip reason=not_found id={id}");
                }
            }
            TaskIntent::ConfirmDeletion => {
                if let Some(id) = self.pending_deletion.take() {
                    self.delete(&id);
                }
            }
            TaskIntent::CancelDeletion => {
                self.pending_deletion = None;
            }
        }
        self.snapshot()
    }

    fn delete(&mut self, id: &TaskId) {
        let current = std::mem::take(&mut self.tasks);
        self.tasks = self.repo.delete(current, id);
        if self.pending_deletion.as_ref() == Some(id) {
            self.pending_deletion = None;
        }
    }

    fn find(&self, id: &TaskId) -> Option<Task> {
        self.tasks.iter().find(|task| &task.id == id).cloned()
    }
}
