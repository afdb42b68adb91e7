// src/engine/mod.rs

//! Orchestration engine for watch mode.
//!
//! Watch bindings send [`RuntimeEvent::TaskTriggered`]; the executor reports
//! back with [`RuntimeEvent::TaskFinished`]. Each task has its own run lock:
//! at most one run of a task is in flight, and triggers that arrive while it
//! runs are queued or cancel the run according to `[config]`.
//!
//! The pure state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

pub use crate::types::TaskName;

/// Why a task was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// A watched file changed.
    FileWatch,
}

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    /// Stop once nothing is running and nothing is queued. Watch mode keeps
    /// this `false`.
    pub exit_when_idle: bool,
}

/// One run of one task, as handed to the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledRun {
    pub task: TaskName,
    /// Monotonically increasing across all tasks.
    pub run_id: u64,
}

/// Events flowing into the runtime from watchers, executors and signals.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    TaskTriggered {
        task: TaskName,
        reason: TriggerReason,
    },
    /// A run finished. `success` is false for aborted tasks and transform
    /// failures alike.
    TaskFinished {
        task: TaskName,
        run_id: u64,
        success: bool,
    },
    /// Graceful shutdown requested (Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod queue;
pub mod runtime;

pub use crate::types::TriggerWhileRunningBehaviour;
pub use self::core::{CoreCommand, CoreRuntime, CoreStep};
pub use queue::TriggerQueue;
pub use runtime::Runtime;
