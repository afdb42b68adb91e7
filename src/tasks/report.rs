// src/tasks/report.rs

use std::path::PathBuf;

use tracing::{error, info, warn};

use crate::errors::PipelineError;
use crate::pipeline::TransformFailure;
use crate::pipeline::stages::format_size;
use crate::types::TaskName;

/// Outcome of one leaf-task run.
#[derive(Debug, Clone, Default)]
pub struct TaskReport {
    pub task: TaskName,
    /// Files written (or removed, for `clean`), absolute.
    pub written: Vec<PathBuf>,
    pub bytes: u64,
    pub failures: Vec<TransformFailure>,
}

impl TaskReport {
    pub fn new(task: impl Into<TaskName>) -> Self {
        Self {
            task: task.into(),
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Aggregate of every leaf task executed for one requested name.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub reports: Vec<TaskReport>,
    /// Leaf tasks that aborted, with the reason.
    pub errors: Vec<(TaskName, PipelineError)>,
}

impl RunSummary {
    pub fn merge(&mut self, other: RunSummary) {
        self.reports.extend(other.reports);
        self.errors.extend(other.errors);
    }

    pub fn failure_count(&self) -> usize {
        self.reports.iter().map(|r| r.failures.len()).sum::<usize>() + self.errors.len()
    }

    pub fn is_success(&self) -> bool {
        self.failure_count() == 0
    }

    /// Print a user-facing summary on stdout and log each problem.
    pub fn print(&self, requested: &str) {
        for report in &self.reports {
            println!(
                "[assetpipe] {}: {} file(s), {}",
                report.task,
                report.written.len(),
                format_size(report.bytes)
            );
            for failure in &report.failures {
                println!("[assetpipe]   error: {failure}");
            }
        }
        for (task, err) in &self.errors {
            error!(task = %task, error = %err, "task aborted");
            println!("[assetpipe] {task}: aborted: {err}");
        }

        if self.is_success() {
            info!(task = %requested, "finished");
        } else {
            warn!(task = %requested, failures = self.failure_count(), "finished with errors");
        }
    }
}
