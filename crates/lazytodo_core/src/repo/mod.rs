//! Task persistence and mutation.
//!
//! # Responsibility
//! - Serialize the task list to the key-value store under one fixed key.
//! - Provide add/toggle/delete operations that always end with a persist.
//!
//! # Invariants
//! - Load failures degrade to an empty list at the call site, never a crash.
//! - Persist failures are logged and leave in-memory state authoritative.

pub mod task_ids;
pub mod task_repo;
