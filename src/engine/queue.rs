// src/engine/queue.rs

use std::collections::HashMap;

use tracing::debug;

use crate::types::TaskName;

/// Follow-up runs requested while a task was already running.
///
/// Each task keeps a counter capped at `max_runs`: a burst of saves while a
/// build is in flight coalesces into at most `max_runs` extra builds.
#[derive(Debug)]
pub struct TriggerQueue {
    max_runs: usize,
    pending: HashMap<TaskName, usize>,
}

impl TriggerQueue {
    /// `max_runs` is clamped to at least 1.
    pub fn new(max_runs: usize) -> Self {
        Self {
            max_runs: max_runs.max(1),
            pending: HashMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending_for(&self, task: &str) -> usize {
        self.pending.get(task).copied().unwrap_or(0)
    }

    pub fn record_trigger(&mut self, task: &str) {
        let count = self.pending.entry(task.to_string()).or_insert(0);
        if *count < self.max_runs {
            *count += 1;
            debug!(task, queued = *count, "queued follow-up run");
        } else {
            debug!(task, max_runs = self.max_runs, "follow-up already queued; coalescing trigger");
        }
    }

    /// Consume one queued run for `task`, if any.
    pub fn take(&mut self, task: &str) -> bool {
        match self.pending.get_mut(task) {
            Some(count) => {
                *count -= 1;
                if *count == 0 {
                    self.pending.remove(task);
                }
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self, task: &str) {
        self.pending.remove(task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triggers_coalesce_up_to_max_runs() {
        let mut queue = TriggerQueue::new(1);
        queue.record_trigger("styles");
        queue.record_trigger("styles");
        queue.record_trigger("styles");

        assert_eq!(queue.pending_for("styles"), 1);
        assert!(queue.take("styles"));
        assert!(!queue.take("styles"));
        assert!(queue.is_empty());
    }

    #[test]
    fn tasks_are_tracked_independently() {
        let mut queue = TriggerQueue::new(2);
        queue.record_trigger("styles");
        queue.record_trigger("scripts");
        queue.record_trigger("scripts");
        queue.record_trigger("scripts");

        assert_eq!(queue.pending_for("styles"), 1);
        assert_eq!(queue.pending_for("scripts"), 2);
    }

    #[test]
    fn zero_length_is_clamped() {
        let mut queue = TriggerQueue::new(0);
        queue.record_trigger("copy");
        assert!(queue.take("copy"));
    }
}
