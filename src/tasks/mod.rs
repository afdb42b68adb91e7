// src/tasks/mod.rs

//! Task definitions and the registry that runs them.
//!
//! Leaf tasks do the actual work (`clean`, `styles`, `styles-prod`,
//! `scripts`, `copy`). Composites (`dev`, `release`, `default` and any
//! `[composite.<name>]` from config) only name other tasks: their `prepare`
//! list runs in order, then their `run` list runs concurrently.

pub mod builtin;
pub mod context;
pub mod leaf;
pub mod names;
pub mod registry;
pub mod report;

use std::future::Future;
use std::pin::Pin;

use crate::errors::Result;

pub use context::TaskContext;
pub use leaf::{CleanTask, CopyTask, PipelineTask};
pub use registry::{RegistryEntry, TaskRegistry};
pub use report::{RunSummary, TaskReport};

pub type TaskFuture<'a> = Pin<Box<dyn Future<Output = Result<TaskReport>> + Send + 'a>>;

/// A leaf unit of work. Tasks are stateless between runs and may be re-run
/// any number of times.
pub trait Task: Send + Sync {
    fn name(&self) -> &str;

    /// One-line description for `--dry-run`.
    fn describe(&self) -> String;

    fn run<'a>(&'a self, ctx: &'a TaskContext) -> TaskFuture<'a>;
}
