//! Presentation models for the host UI.
//!
//! # Responsibility
//! - Keep screen state machines and validation rules out of the host UI.
//! - Never mutate task state directly; screens emit actions the caller routes.

pub mod dialog;
pub mod login_form;
pub mod navigator;
pub mod remote_list;
