//! Staged rollout scenario.
//!
//! The rollout is a fixed sequence of config documents. Each stage loads
//! its document, points it at the target host, submits it as the group's
//! new desired state, and blocks until every managed process reports the
//! new goal version. A stage that fails stops the rollout so later
//! documents never build on a state the fleet did not reach.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;

use convoy_client::{AutomationClient, WaitOptions, wait_for_goal_state};
use convoy_config::{AutomationConfig, TargetHost};

/// One rollout stage: a named config document.
#[derive(Debug, Clone, Copy)]
pub struct Stage {
    /// Stage name used in logs and error context.
    pub name: &'static str,
    /// Document file name under the configs directory.
    pub file: &'static str,
}

/// The stage that wipes the group back to an empty deployment.
pub const CLEAN_STAGE: Stage = Stage {
    name: "clean state",
    file: "api_0_clean.json",
};

/// The full rollout, in submission order.
///
/// Each stage builds on the one before it: versions are published before
/// agents install, the replica set exists before it is grown, and auth
/// comes last so every process restarts with key material in place.
pub const STAGES: &[Stage] = &[
    CLEAN_STAGE,
    Stage {
        name: "define versions",
        file: "api_1_define_versions.json",
    },
    Stage {
        name: "install other agents",
        file: "api_2_install_other_agents.json",
    },
    Stage {
        name: "create replica set",
        file: "api_3_create_replica_set.json",
    },
    Stage {
        name: "upgrade replica set",
        file: "api_4_upgrade_replica_set.json",
    },
    Stage {
        name: "replica set to cluster",
        file: "api_5_replica_set_to_cluster.json",
    },
    Stage {
        name: "enable auth",
        file: "api_6_enable_auth.json",
    },
];

/// Drives the staged rollout against one automation group.
#[derive(Debug)]
pub struct Scenario {
    /// Client for the group under automation.
    client: AutomationClient,
    /// Host every document is pointed at before submission.
    target: TargetHost,
    /// Directory holding the stage documents.
    configs_dir: PathBuf,
    /// Bounds applied to each per-stage goal-state wait.
    options: WaitOptions,
}

impl Scenario {
    /// Create a scenario over a client and target host.
    pub fn new(
        client: AutomationClient,
        target: TargetHost,
        configs_dir: impl Into<PathBuf>,
        options: WaitOptions,
    ) -> Self {
        Self {
            client,
            target,
            configs_dir: configs_dir.into(),
            options,
        }
    }

    /// Run every stage in order, stopping at the first failure.
    pub async fn run_full(&self) -> Result<()> {
        let start = Instant::now();
        info!(
            stages = STAGES.len(),
            host = %self.target,
            "Starting full rollout"
        );

        for stage in STAGES {
            self.run_stage(stage).await?;
        }

        info!(elapsed = ?start.elapsed(), "Rollout complete");
        Ok(())
    }

    /// Submit only the cleanup document and wait for it to take effect.
    ///
    /// The group ends empty but converged, so agents are idle rather than
    /// mid-plan when the next rollout starts.
    pub async fn run_clean(&self) -> Result<()> {
        info!(host = %self.target, "Resetting group to a clean state");
        self.run_stage(&CLEAN_STAGE).await
    }

    /// Submit one stage document and wait for the fleet to converge on it.
    async fn run_stage(&self, stage: &Stage) -> Result<()> {
        let start = Instant::now();
        let path = self.configs_dir.join(stage.file);
        info!(stage = stage.name, path = %path.display(), "Submitting stage");

        let mut config = AutomationConfig::from_path(&path)
            .with_context(|| format!("stage '{}': loading {} failed", stage.name, path.display()))?;
        config.retarget(&self.target);

        self.client
            .submit_config(&config)
            .await
            .with_context(|| format!("stage '{}': config submission rejected", stage.name))?;

        let report = wait_for_goal_state(&self.client, &self.options)
            .await
            .with_context(|| format!("stage '{}': fleet did not reach goal state", stage.name))?;

        info!(
            stage = stage.name,
            goal_version = report.goal_version,
            rounds = report.rounds,
            elapsed = ?start.elapsed(),
            "Stage reached goal state"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]
    #![allow(clippy::panic)]

    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_rollout_starts_from_the_clean_document() {
        let first = STAGES.first().unwrap();
        assert_eq!(first.file, CLEAN_STAGE.file);
        assert_eq!(first.name, CLEAN_STAGE.name);
    }

    #[test]
    fn test_stage_files_are_distinct_and_ordered() {
        let files: Vec<&str> = STAGES.iter().map(|stage| stage.file).collect();
        let unique: HashSet<&str> = files.iter().copied().collect();
        assert_eq!(unique.len(), STAGES.len());

        let mut sorted = files.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, files, "stage files should sort in rollout order");
    }

    #[test]
    fn test_auth_is_the_final_stage() {
        let last = STAGES.last().unwrap();
        assert_eq!(last.name, "enable auth");
    }
}
