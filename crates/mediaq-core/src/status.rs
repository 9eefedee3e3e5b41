//! Lifecycle state machine and the wire statuses that feed it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::CoreError;

/// Lifecycle state of a Task as tracked locally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleState {
    /// Accepted by the service, not started yet.
    #[default]
    Pending,
    /// The worker is producing the file.
    Downloading,
    /// Finished; a result is available.
    Success,
    /// Finished without a result.
    Failure,
}

impl LifecycleState {
    /// Returns true if no further transition is permitted.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failure)
    }

    /// Returns true if the task is still being worked on.
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Edges of the lifecycle DAG.
    ///
    /// `Pending -> {Downloading, Success, Failure}`, `Downloading -> {Success, Failure}`.
    pub fn can_transition_to(&self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, next),
            (Pending, Downloading | Success | Failure) | (Downloading, Success | Failure)
        )
    }

    /// Label shown in the queue.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Queued",
            Self::Downloading => "Downloading",
            Self::Success => "Ready",
            Self::Failure => "Failed",
        }
    }

    /// Upper-case name, matching the wire spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Downloading => "DOWNLOADING",
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status string reported by `GET /status/{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteStatus {
    Queued,
    Pending,
    Downloading,
    Success,
    Failure,
}

impl RemoteStatus {
    /// Map to the local lifecycle state. `Queued` and `Pending` are synonyms.
    pub fn lifecycle(&self) -> LifecycleState {
        match self {
            Self::Queued | Self::Pending => LifecycleState::Pending,
            Self::Downloading => LifecycleState::Downloading,
            Self::Success => LifecycleState::Success,
            Self::Failure => LifecycleState::Failure,
        }
    }
}

impl FromStr for RemoteStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "QUEUED" => Ok(Self::Queued),
            "PENDING" => Ok(Self::Pending),
            "DOWNLOADING" => Ok(Self::Downloading),
            "SUCCESS" => Ok(Self::Success),
            "FAILURE" => Ok(Self::Failure),
            other => Err(CoreError::UnknownStatus(other.to_string())),
        }
    }
}

impl From<RemoteStatus> for LifecycleState {
    fn from(status: RemoteStatus) -> Self {
        status.lifecycle()
    }
}
