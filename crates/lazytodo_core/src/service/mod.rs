//! Use-case layer between the host UI and the repository.
//!
//! # Responsibility
//! - Hold canonical task list state for the list screen.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod task_list_store;
