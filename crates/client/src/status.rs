//! Automation status snapshots reported by the control plane.

use serde::{Deserialize, Serialize};

/// Snapshot of a group's convergence state.
///
/// Produced fresh on every poll and never cached: convergence decisions
/// always compare against the snapshot's own goal version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationStatus {
    /// Version of the most recently accepted config document.
    pub goal_version: i64,

    /// Per-process convergence state.
    #[serde(default)]
    pub processes: Vec<ProcessStatus>,
}

/// Convergence state of one managed process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessStatus {
    /// Host the process runs on.
    pub hostname: String,

    /// Last goal version this process has applied. `-1` when the process
    /// has never applied any config.
    pub last_goal_version_achieved: i64,

    /// Plan steps still ahead of this process.
    #[serde(default)]
    pub plan: Vec<String>,
}

impl AutomationStatus {
    /// True when every process has reached the goal version. An empty
    /// process list is trivially converged.
    pub fn is_converged(&self) -> bool {
        self.processes
            .iter()
            .all(|process| process.last_goal_version_achieved >= self.goal_version)
    }

    /// Processes still behind the goal version.
    pub fn lagging(&self) -> impl Iterator<Item = &ProcessStatus> {
        self.processes
            .iter()
            .filter(|process| process.last_goal_version_achieved < self.goal_version)
    }
}
