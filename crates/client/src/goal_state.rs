//! Goal-state wait loop.
//!
//! After a config submission the control plane bumps the group's goal
//! version and each automation agent works its plan until its process
//! reports that version as achieved. This module polls the status
//! endpoint until the whole fleet has caught up, logging one progress
//! line per process per round.

use std::num::NonZeroU32;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tracing::info;

use crate::client::AutomationClient;
use crate::error::{Error, Result};
use crate::status::AutomationStatus;

/// Bounds for a goal-state wait.
///
/// The defaults poll once a second for at most 120 rounds. Unbounded
/// waiting is an explicit opt-in via [`WaitOptions::unbounded`].
#[derive(Debug, Clone)]
pub struct WaitOptions {
    /// Pause between status polls.
    pub interval: Duration,

    /// Maximum status polls before giving up. `None` polls forever.
    pub max_rounds: Option<NonZeroU32>,

    /// Wall-clock budget for the whole wait. `None` waits forever.
    pub deadline: Option<Duration>,

    /// Cooperative cancel checked before each poll.
    pub cancel: Option<CancelToken>,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_rounds: NonZeroU32::new(120),
            deadline: None,
            cancel: None,
        }
    }
}

impl WaitOptions {
    /// Options that poll until convergence with no round or time bound.
    #[must_use]
    pub fn unbounded() -> Self {
        Self {
            max_rounds: None,
            ..Self::default()
        }
    }

    /// Options with millisecond pacing for tests.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            interval: Duration::from_millis(10),
            max_rounds: NonZeroU32::new(20),
            deadline: None,
            cancel: None,
        }
    }

    /// Set the poll interval.
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the round budget. `None` polls forever.
    #[must_use]
    pub const fn with_max_rounds(mut self, max_rounds: Option<NonZeroU32>) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Set a wall-clock budget for the whole wait.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Attach a cancel token.
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// Create a linked cancel handle/token pair.
///
/// The handle side belongs to whoever can interrupt the wait (a signal
/// listener, a test); the token side goes into [`WaitOptions`].
#[must_use]
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (cancel_tx, cancel_rx) = watch::channel(false);
    (CancelHandle { cancel_tx }, CancelToken { cancel_rx })
}

/// Handle that cancels a wait in progress.
#[derive(Debug)]
pub struct CancelHandle {
    cancel_tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Cancel the paired wait before its next poll.
    pub fn cancel(&self) {
        let _ = self.cancel_tx.send(true);
    }
}

/// Token observed by the wait loop.
#[derive(Debug, Clone)]
pub struct CancelToken {
    cancel_rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// True once the paired handle has cancelled.
    pub fn is_cancelled(&self) -> bool {
        *self.cancel_rx.borrow()
    }
}

/// Outcome of a successful wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoalStateReport {
    /// Goal version the fleet converged on.
    pub goal_version: i64,

    /// Status polls it took to observe convergence.
    pub rounds: u32,
}

/// Poll the control plane until every process reaches the goal version.
///
/// Each round fetches a fresh status snapshot and logs the round number,
/// goal version, and per-process achieved version and plan. The loop
/// returns after the first converged snapshot with no further fetch; an
/// empty process list converges on round one. API failures propagate
/// immediately, only "not yet converged" is retried. The cancel token
/// and deadline are checked before each poll, the round budget after an
/// unconverged snapshot, so a budget of N performs exactly N fetches.
pub async fn wait_for_goal_state(
    client: &AutomationClient,
    options: &WaitOptions,
) -> Result<GoalStateReport> {
    let started = Instant::now();
    let mut round: u32 = 0;

    loop {
        if options.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            return Err(Error::WaitCancelled);
        }
        if let Some(deadline) = options.deadline {
            if started.elapsed() >= deadline {
                return Err(Error::deadline_exceeded(started.elapsed()));
            }
        }

        let status = client.fetch_status().await?;
        round = round.saturating_add(1);
        log_round(round, &status);

        if status.is_converged() {
            info!(
                goal_version = status.goal_version,
                rounds = round,
                "All processes in goal state"
            );
            return Ok(GoalStateReport {
                goal_version: status.goal_version,
                rounds: round,
            });
        }

        if let Some(max_rounds) = options.max_rounds {
            if round >= max_rounds.get() {
                return Err(Error::rounds_exhausted(round, status.goal_version));
            }
        }

        tokio::time::sleep(options.interval).await;
    }
}

/// One progress line per process, the operator's view of the rollout.
fn log_round(round: u32, status: &AutomationStatus) {
    for process in &status.processes {
        info!(
            round,
            goal_version = status.goal_version,
            process = %process.hostname,
            achieved = process.last_goal_version_achieved,
            plan = ?process.plan,
            "Waiting for goal state"
        );
    }
}
