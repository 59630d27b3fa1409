//! Flutter bridge for the LazyTodo core.

pub mod api;
