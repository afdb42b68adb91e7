// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::errors::Result;
use crate::exec::ExecutorBackend;

use super::core::CoreRuntime;
use super::{CoreCommand, RuntimeEvent};

/// Async shell around [`CoreRuntime`]: reads events from the channel, feeds
/// them to the core and hands the resulting runs to an [`ExecutorBackend`].
pub struct Runtime<E: ExecutorBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(core: CoreRuntime, event_rx: mpsc::Receiver<RuntimeEvent>, executor: E) -> Self {
        Self {
            core,
            event_rx,
            executor,
        }
    }

    /// Main event loop. Returns when the core asks to stop or every sender
    /// has been dropped.
    pub async fn run(mut self) -> Result<()> {
        info!("watch runtime started");

        while let Some(event) = self.event_rx.recv().await {
            debug!(?event, "runtime received event");

            let step = self.core.step(event);
            for command in step.commands {
                self.execute_command(command).await?;
            }

            if !step.keep_running {
                info!("core requested exit; stopping runtime");
                self.executor.cancel_all();
                return Ok(());
            }
        }

        info!("runtime event channel closed; exiting");
        Ok(())
    }

    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::Start(run) => {
                debug!(task = %run.task, run_id = run.run_id, "starting run");
                self.executor.start_run(run).await
            }
            CoreCommand::Restart(run) => {
                debug!(task = %run.task, run_id = run.run_id, "restarting run");
                self.executor.cancel_run(&run.task);
                self.executor.start_run(run).await
            }
            CoreCommand::RequestExit => {
                debug!("core issued RequestExit");
                Ok(())
            }
        }
    }
}
