//! Domain model for the to-do list.
//!
//! # Responsibility
//! - Define the canonical task record shared by repository, store and FFI.
//!
//! # Invariants
//! - Every task is identified by a non-empty `TaskId`.
//! - Task text is never blank after trimming.

pub mod task;
