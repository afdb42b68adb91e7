// src/exec/mod.rs

//! Execution layer for watch mode.
//!
//! The runtime talks to an [`ExecutorBackend`]; production uses
//! [`RegistryExecutor`], which runs tasks from the [`TaskRegistry`] on Tokio
//! tasks. Tests substitute a fake that completes runs immediately.
//!
//! [`TaskRegistry`]: crate::tasks::TaskRegistry

pub mod backend;

pub use backend::{ExecutorBackend, RegistryExecutor};
