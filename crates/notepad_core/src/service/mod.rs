//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store calls into editor and todo use-cases.
//! - Keep controllers and the CLI decoupled from storage details.

pub mod note_service;
pub mod todo_service;
