//! Task domain model.
//!
//! # Responsibility
//! - Define the task record and its persisted JSON shape.
//! - Enforce text/id validation on construction and deserialization.
//!
//! # Invariants
//! - `text` is never blank. New tasks store it trimmed; persisted text is
//!   loaded as written.
//! - `id` is never empty.
//! - `completed` starts as `false` for newly created tasks.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Ordered task collection. New tasks are appended at the end.
pub type TaskList = Vec<Task>;

/// Opaque task identifier.
///
/// Serialized as a bare JSON string to match the persisted layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Wraps a raw id string without validation.
    ///
    /// Used by lookup paths (FFI, tests) where a missing match is a no-op.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Numeric value for clock-derived ids, `None` for foreign id shapes.
    pub fn as_millis(&self) -> Option<u64> {
        self.0.parse::<u64>().ok()
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Validation failures for task construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    /// Text is empty or whitespace only.
    BlankText,
    /// Id is empty or whitespace only.
    BlankId,
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankText => write!(f, "task text must not be blank"),
            Self::BlankId => write!(f, "task id must not be blank"),
        }
    }
}

impl Error for TaskValidationError {}

/// One to-do entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TaskRecord")]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    pub completed: bool,
}

impl Task {
    /// Creates an open task with trimmed text.
    ///
    /// # Errors
    /// - `BlankText` when `text` trims to an empty string.
    /// - `BlankId` when `id` is empty.
    pub fn new(id: TaskId, text: &str) -> Result<Self, TaskValidationError> {
        let task = Self {
            id,
            text: text.trim().to_string(),
            completed: false,
        };
        task.validate()?;
        Ok(task)
    }

    /// Validates id and text invariants.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.id.as_str().trim().is_empty() {
            return Err(TaskValidationError::BlankId);
        }
        if self.text.trim().is_empty() {
            return Err(TaskValidationError::BlankText);
        }
        Ok(())
    }

    /// Flips the completion flag.
    pub fn toggle(&mut self) {
        self.completed = !self.completed;
    }
}

// Raw persisted shape; converted through `Task::validate`.
#[derive(Deserialize)]
struct TaskRecord {
    id: TaskId,
    text: String,
    #[serde(default)]
    completed: bool,
}

impl TryFrom<TaskRecord> for Task {
    type Error = TaskValidationError;

    fn try_from(value: TaskRecord) -> Result<Self, Self::Error> {
        let task = Self {
            id: value.id,
            text: value.text,
            completed: value.completed,
        };
        task.validate()?;
        Ok(task)
    }
}

/// Returns whether `text` would produce a task.
pub fn is_blank_text(text: &str) -> bool {
    text.trim().is_empty()
}
