// src/watch/binding.rs

use std::path::Path;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::model::ConfigFile;
use crate::engine::{RuntimeEvent, TriggerReason};
use crate::errors::Result;
use crate::paths::PatternSet;
use crate::tasks::names;
use crate::types::TaskName;
use crate::watch::subscription::subscribe;

/// A pattern set whose changes re-trigger `task`.
#[derive(Debug, Clone)]
pub struct WatchBinding {
    pub patterns: PatternSet,
    pub task: TaskName,
}

impl WatchBinding {
    pub fn new(patterns: PatternSet, task: impl Into<TaskName>) -> Self {
        Self {
            patterns,
            task: task.into(),
        }
    }
}

/// styles -> `styles`, scripts -> `scripts`, html -> `copy`.
pub fn standard_bindings(cfg: &ConfigFile) -> Vec<WatchBinding> {
    let patterns = cfg.patterns();
    vec![
        WatchBinding::new(patterns.styles_set(), names::STYLES),
        WatchBinding::new(patterns.scripts_set(), names::SCRIPTS),
        WatchBinding::new(patterns.html_set(), names::COPY),
    ]
}

/// Keeps a binding alive; dropping it stops the subscription.
#[derive(Debug)]
pub struct WatchHandle {
    task: TaskName,
    join: JoinHandle<()>,
}

impl WatchHandle {
    pub fn task(&self) -> &str {
        &self.task
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.join.abort();
    }
}

/// Subscribe every binding under `root` and forward each matching change to
/// the runtime as a trigger, printing a notification line per change.
pub fn spawn_bindings(
    root: &Path,
    bindings: Vec<WatchBinding>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> Result<Vec<WatchHandle>> {
    let mut handles = Vec::with_capacity(bindings.len());

    for binding in bindings {
        let mut subscription = subscribe(root, &binding.patterns)?;
        let tx = runtime_tx.clone();
        let task = binding.task.clone();

        let join = tokio::spawn(async move {
            while let Some(change) = subscription.recv().await {
                println!(
                    "File {} was {}, running {}...",
                    change.path.display(),
                    change.kind.verb(),
                    task
                );
                info!(task = %task, path = %change.rel, kind = change.kind.verb(), "watch trigger");

                let event = RuntimeEvent::TaskTriggered {
                    task: task.clone(),
                    reason: TriggerReason::FileWatch,
                };
                if tx.send(event).await.is_err() {
                    debug!(task = %task, "runtime closed; ending watch binding");
                    break;
                }
            }
            subscription.unsubscribe();
        });

        handles.push(WatchHandle {
            task: binding.task,
            join,
        });
    }

    Ok(handles)
}
