//! Per-task status pollers.
//!
//! Every task gets at most one poll loop, spawned on the tokio runtime and
//! bound to a [`PollHandle`]. The loop probes `GET /status/{id}` on a fixed
//! interval, feeds the mapped state into the registry and stops on a
//! terminal state, on removal of the task, or when the failure budget runs
//! out.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use mediaq_client::{ClientError, RemoteTaskService, StatusReport};
use mediaq_core::{LifecycleState, RemoteStatus, TaskId, TaskResult, Transition};

use crate::config::{Config, MIN_POLL_INTERVAL};
use crate::error::EngineError;
use crate::registry::{PollClaim, Registry};

/// Reason recorded when the service reports FAILURE without one.
pub const UNKNOWN_FAILURE: &str = "Unknown error";

/// A single failed status probe. Retried on the next tick.
#[derive(Debug, Error)]
pub enum PollError {
    /// Transport or protocol failure talking to the service.
    #[error(transparent)]
    Transient(#[from] ClientError),

    /// The service reported a status this client does not know.
    #[error("unrecognized status '{0}'")]
    UnrecognizedStatus(String),
}

/// Ownership token of a running poll loop.
///
/// Cloning shares the same underlying cancellation; releasing any clone
/// stops the loop.
#[derive(Debug, Clone)]
pub struct PollHandle {
    task_id: TaskId,
    generation: u64,
    token: CancellationToken,
}

impl PollHandle {
    pub(crate) fn new(task_id: TaskId, generation: u64, token: CancellationToken) -> Self {
        Self {
            task_id,
            generation,
            token,
        }
    }

    /// Task this handle polls for.
    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    /// Distinguishes successive pollers of the same task.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns true until the loop has been released.
    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Wait until the handle is released.
    pub async fn stopped(&self) {
        self.token.cancelled().await;
    }

    pub(crate) fn release(&self) {
        self.token.cancel();
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }
}

/// Map a status report to a lifecycle update.
///
/// `locator` is where the finished file can be fetched from; it becomes part
/// of the task's result.
pub fn report_to_transition(
    report: StatusReport,
    locator: String,
) -> Result<Transition, PollError> {
    let status: RemoteStatus = report
        .state
        .parse()
        .map_err(|_| PollError::UnrecognizedStatus(report.state.clone()))?;

    let transition = match status.lifecycle() {
        LifecycleState::Pending => Transition::Pending,
        LifecycleState::Downloading => Transition::Downloading,
        LifecycleState::Success => {
            let payload = report.result.unwrap_or_default();
            let result = TaskResult::new(payload.filename.unwrap_or_default(), payload.size, locator)
                .with_extra(payload.extra);
            Transition::Succeeded(result)
        }
        LifecycleState::Failure => {
            Transition::Failed(report.error.unwrap_or_else(|| UNKNOWN_FAILURE.to_string()))
        }
    };
    Ok(transition)
}

/// Starts poll loops for tasks in a registry.
#[derive(Clone)]
pub struct Poller {
    service: Arc<dyn RemoteTaskService>,
    registry: Registry,
    interval: Duration,
    budget: u32,
}

impl Poller {
    /// Create a new Poller.
    pub fn new(service: Arc<dyn RemoteTaskService>, registry: Registry, config: &Config) -> Self {
        Self {
            service,
            registry,
            interval: config.poll_interval.max(MIN_POLL_INTERVAL),
            budget: config.poll_budget.max(1),
        }
    }

    /// Start polling a task. Returns the running loop's handle if there is one.
    ///
    /// Must be called from within a tokio runtime.
    pub fn attach(&self, task_id: &TaskId) -> Result<PollHandle, EngineError> {
        match self.registry.claim_poller(task_id)? {
            PollClaim::Existing(handle) => {
                debug!(task_id = %task_id, "Poller already attached");
                Ok(handle)
            }
            PollClaim::New(handle) => {
                let session = PollSession {
                    service: self.service.clone(),
                    registry: self.registry.clone(),
                    handle: handle.clone(),
                    interval: self.interval,
                    budget: self.budget,
                };
                tokio::spawn(session.run());
                Ok(handle)
            }
        }
    }
}

/// State of one poll loop. The failure counter lives here, not on the task.
struct PollSession {
    service: Arc<dyn RemoteTaskService>,
    registry: Registry,
    handle: PollHandle,
    interval: Duration,
    budget: u32,
}

impl PollSession {
    async fn run(self) {
        let id = self.handle.task_id().clone();
        let token = self.handle.token().clone();
        let started = Instant::now();

        let mut ticker = tokio::time::interval_at(started + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut failures: u32 = 0;

        debug!(task_id = %id, interval_ms = self.interval.as_millis() as u64, "Poller started");

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match self.registry.get(&id) {
                None => {
                    debug!(task_id = %id, "Task removed, stopping poller");
                    break;
                }
                Some(task) if task.is_terminal() => break,
                Some(_) => {}
            }

            let response = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                response = self.service.task_status(&id) => response,
            };

            // Removal may have happened while the request was in flight.
            if token.is_cancelled() || !self.registry.contains(&id) {
                debug!(task_id = %id, "Dropping status for removed task");
                break;
            }

            let update = response
                .map_err(PollError::from)
                .and_then(|report| report_to_transition(report, self.service.file_url(&id)));

            match update {
                Ok(transition) => {
                    failures = 0;
                    let state = transition.state();
                    self.registry.transition(&id, transition);
                    if state.is_terminal() {
                        info!(task_id = %id, state = %state, "Task finished, stopping poller");
                        break;
                    }
                }
                Err(err) => {
                    failures += 1;
                    warn!(
                        task_id = %id,
                        failures,
                        budget = self.budget,
                        error = %err,
                        "Status check failed"
                    );
                    if failures >= self.budget {
                        let reason =
                            format!("Timeout after {}s: {}", started.elapsed().as_secs(), err);
                        warn!(task_id = %id, reason = %reason, "Poll budget exhausted");
                        self.registry.transition(&id, Transition::Failed(reason));
                        break;
                    }
                }
            }
        }

        self.registry.release_poller(&self.handle);
        debug!(task_id = %id, "Poller stopped");
    }
}
