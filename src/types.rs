use std::str::FromStr;

use serde::Deserialize;

/// Canonical task name type used throughout the crate.
pub type TaskName = String;

/// Behaviour when a watch trigger arrives while the same task is still running.
///
/// - `Queue`: remember the trigger and run the task again once the current run
///   finishes (default behaviour). Repeated triggers are coalesced up to
///   `queue_length` follow-up runs.
/// - `Cancel`: abort the in-flight run and start a fresh one immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TriggerWhileRunningBehaviour {
    #[default]
    Queue,
    Cancel,
}

impl FromStr for TriggerWhileRunningBehaviour {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "queue" => Ok(TriggerWhileRunningBehaviour::Queue),
            "cancel" => Ok(TriggerWhileRunningBehaviour::Cancel),
            other => Err(format!(
                "invalid triggered_while_running_behaviour: {other} (expected \"queue\" or \"cancel\")"
            )),
        }
    }
}

/// Kind of filesystem change reported to a watch binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Deleted,
}

impl ChangeKind {
    /// Past-tense verb used in user-facing notifications.
    pub fn verb(self) -> &'static str {
        match self {
            ChangeKind::Created => "added",
            ChangeKind::Modified => "changed",
            ChangeKind::Deleted => "deleted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn behaviour_parses_case_insensitively() {
        assert_eq!(
            " Cancel ".parse::<TriggerWhileRunningBehaviour>(),
            Ok(TriggerWhileRunningBehaviour::Cancel)
        );
        assert!("restart".parse::<TriggerWhileRunningBehaviour>().is_err());
    }
}
