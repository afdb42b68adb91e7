// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! Consumes [`RuntimeEvent`]s and returns the commands the IO shell should
//! carry out. No Tokio, channels, filesystem or processes in here, so the
//! overlap policy can be unit tested directly.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::engine::queue::TriggerQueue;
use crate::engine::{RuntimeEvent, RuntimeOptions, ScheduledRun, TaskName, TriggerReason};
use crate::types::TriggerWhileRunningBehaviour;

/// Command produced by the core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Start a run; the task is known not to be running.
    Start(ScheduledRun),
    /// Abort the in-flight run of `run.task`, then start `run`.
    Restart(ScheduledRun),
    /// Nothing left to do and `exit_when_idle` is set.
    RequestExit,
}

/// Decision returned by the core after handling a single event.
#[derive(Debug, Clone)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    pub keep_running: bool,
}

impl CoreStep {
    fn keep(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }
}

#[derive(Debug)]
pub struct CoreRuntime {
    behaviour: TriggerWhileRunningBehaviour,
    queue: TriggerQueue,
    options: RuntimeOptions,
    /// In-flight run id per task.
    running: HashMap<TaskName, u64>,
    next_run_id: u64,
}

impl CoreRuntime {
    pub fn new(
        behaviour: TriggerWhileRunningBehaviour,
        queue_length: usize,
        options: RuntimeOptions,
    ) -> Self {
        Self {
            behaviour,
            queue: TriggerQueue::new(queue_length),
            options,
            running: HashMap::new(),
            next_run_id: 1,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.running.is_empty()
    }

    pub fn is_running(&self, task: &str) -> bool {
        self.running.contains_key(task)
    }

    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::TaskTriggered { task, reason } => self.handle_trigger(task, reason),
            RuntimeEvent::TaskFinished {
                task,
                run_id,
                success,
            } => self.handle_finished(task, run_id, success),
            RuntimeEvent::ShutdownRequested => {
                info!("shutdown requested");
                CoreStep {
                    commands: Vec::new(),
                    keep_running: false,
                }
            }
        }
    }

    fn handle_trigger(&mut self, task: TaskName, reason: TriggerReason) -> CoreStep {
        if !self.running.contains_key(&task) {
            debug!(task = %task, ?reason, "task idle; starting run");
            let run = self.schedule(task);
            return CoreStep::keep(vec![CoreCommand::Start(run)]);
        }

        match self.behaviour {
            TriggerWhileRunningBehaviour::Queue => {
                self.queue.record_trigger(&task);
                CoreStep::keep(Vec::new())
            }
            TriggerWhileRunningBehaviour::Cancel => {
                info!(task = %task, "task still running; cancelling and restarting");
                self.queue.clear(&task);
                let run = self.schedule(task);
                CoreStep::keep(vec![CoreCommand::Restart(run)])
            }
        }
    }

    fn handle_finished(&mut self, task: TaskName, run_id: u64, success: bool) -> CoreStep {
        if self.running.get(&task) != Some(&run_id) {
            debug!(task = %task, run_id, "ignoring completion of a superseded run");
            return CoreStep::keep(Vec::new());
        }
        self.running.remove(&task);

        if success {
            info!(task = %task, run_id, "run finished");
        } else {
            warn!(task = %task, run_id, "run finished with errors; still watching");
        }

        let mut commands = Vec::new();
        if self.queue.take(&task) {
            commands.push(CoreCommand::Start(self.schedule(task)));
        }

        if self.options.exit_when_idle && self.is_idle() && self.queue.is_empty() {
            commands.push(CoreCommand::RequestExit);
            return CoreStep {
                commands,
                keep_running: false,
            };
        }

        CoreStep::keep(commands)
    }

    fn schedule(&mut self, task: TaskName) -> ScheduledRun {
        let run_id = self.next_run_id;
        self.next_run_id += 1;
        self.running.insert(task.clone(), run_id);
        ScheduledRun { task, run_id }
    }
}
