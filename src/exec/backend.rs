// src/exec/backend.rs

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::engine::{RuntimeEvent, ScheduledRun};
use crate::errors::Result;
use crate::tasks::{TaskContext, TaskRegistry};
use crate::types::TaskName;

/// Trait abstracting how scheduled runs are executed.
pub trait ExecutorBackend: Send {
    /// Begin `run`. Completion is reported asynchronously with
    /// [`RuntimeEvent::TaskFinished`] carrying the same `run_id`.
    fn start_run(
        &mut self,
        run: ScheduledRun,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Abort the in-flight run of `task`, if any. No completion is reported
    /// for an aborted run.
    fn cancel_run(&mut self, task: &str);

    fn cancel_all(&mut self) {}
}

/// Production backend: one Tokio task per run, at most one per task name.
pub struct RegistryExecutor {
    registry: Arc<TaskRegistry>,
    ctx: Arc<TaskContext>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    active: HashMap<TaskName, JoinHandle<()>>,
}

impl RegistryExecutor {
    pub fn new(
        registry: Arc<TaskRegistry>,
        ctx: Arc<TaskContext>,
        runtime_tx: mpsc::Sender<RuntimeEvent>,
    ) -> Self {
        Self {
            registry,
            ctx,
            runtime_tx,
            active: HashMap::new(),
        }
    }
}

impl ExecutorBackend for RegistryExecutor {
    fn start_run(
        &mut self,
        run: ScheduledRun,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.active.retain(|_, handle| !handle.is_finished());
            self.cancel_run(&run.task);

            let registry = Arc::clone(&self.registry);
            let ctx = Arc::clone(&self.ctx);
            let tx = self.runtime_tx.clone();
            let ScheduledRun { task, run_id } = run;
            let name = task.clone();

            let handle = tokio::spawn(async move {
                info!(task = %task, run_id, "run started");
                let success = match registry.run(task.clone(), ctx).await {
                    Ok(summary) => {
                        summary.print(&task);
                        summary.is_success()
                    }
                    Err(err) => {
                        error!(task = %task, run_id, error = %err, "run failed");
                        false
                    }
                };
                if tx
                    .send(RuntimeEvent::TaskFinished {
                        task: task.clone(),
                        run_id,
                        success,
                    })
                    .await
                    .is_err()
                {
                    debug!(task = %task, run_id, "runtime gone; dropping completion");
                }
            });

            self.active.insert(name, handle);
            Ok(())
        })
    }

    fn cancel_run(&mut self, task: &str) {
        if let Some(handle) = self.active.remove(task) {
            if !handle.is_finished() {
                info!(task, "aborting in-flight run");
                handle.abort();
            }
        }
    }

    fn cancel_all(&mut self) {
        for (task, handle) in self.active.drain() {
            if !handle.is_finished() {
                debug!(task = %task, "aborting run on shutdown");
                handle.abort();
            }
        }
    }
}

impl std::fmt::Debug for RegistryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryExecutor")
            .field("active", &self.active.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
