//! Task type and its transition rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{LifecycleState, MediaKind, QualityTier, TaskId};

/// Output of a successfully completed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    /// Name of the produced file.
    pub filename: String,

    /// Size in bytes, when the service reported it.
    pub size: Option<u64>,

    /// Where the file can be retrieved from (`{base}/file/{id}`).
    pub locator: String,

    /// Any additional fields the service attached to the result.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl TaskResult {
    /// Create a new TaskResult.
    pub fn new(filename: impl Into<String>, size: Option<u64>, locator: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            size,
            locator: locator.into(),
            extra: Map::new(),
        }
    }

    /// Builder method to attach extra service-reported fields.
    pub fn with_extra(mut self, extra: Map<String, Value>) -> Self {
        self.extra = extra;
        self
    }
}

/// A state update pushed into a Task.
///
/// Terminal variants carry their payload so a result can only exist on a
/// successful task and a reason only on a failed one.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Pending,
    Downloading,
    Succeeded(TaskResult),
    Failed(String),
}

impl Transition {
    /// Lifecycle state this update moves to.
    pub fn state(&self) -> LifecycleState {
        match self {
            Self::Pending => LifecycleState::Pending,
            Self::Downloading => LifecycleState::Downloading,
            Self::Succeeded(_) => LifecycleState::Success,
            Self::Failed(_) => LifecycleState::Failure,
        }
    }
}

/// What applying a [`Transition`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The state changed.
    Applied {
        from: LifecycleState,
        to: LifecycleState,
    },
    /// The task was already in that state.
    Unchanged,
    /// The edge is not in the lifecycle DAG (stale report or terminal task).
    Rejected {
        from: LifecycleState,
        to: LifecycleState,
    },
}

impl TransitionOutcome {
    /// Returns true if the task was mutated.
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// One submitted media job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Identifier assigned by the remote service.
    pub id: TaskId,

    /// URL the user asked to convert.
    pub source_url: String,

    /// Audio or video.
    pub media_kind: MediaKind,

    /// Requested quality tier.
    pub quality: QualityTier,

    /// Current lifecycle state.
    pub state: LifecycleState,

    /// Set once the task succeeds.
    pub result: Option<TaskResult>,

    /// Set once the task fails.
    pub failure_reason: Option<String>,

    /// When the submission was accepted.
    pub submitted_at: DateTime<Utc>,
}

impl Task {
    /// Create a new pending Task.
    pub fn new(
        id: TaskId,
        source_url: impl Into<String>,
        media_kind: MediaKind,
        quality: QualityTier,
    ) -> Self {
        Self {
            id,
            source_url: source_url.into(),
            media_kind,
            quality,
            state: LifecycleState::Pending,
            result: None,
            failure_reason: None,
            submitted_at: Utc::now(),
        }
    }

    /// Check if the task is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Whether the task belongs in the playlist.
    pub fn is_playable(&self) -> bool {
        self.state == LifecycleState::Success && self.media_kind.is_playable()
    }

    /// Apply a state update following the lifecycle DAG.
    ///
    /// Re-reporting the current state is absorbed without touching the
    /// payload, so a duplicate `Succeeded` never overwrites the first result.
    pub fn apply(&mut self, transition: Transition) -> TransitionOutcome {
        let from = self.state;
        let to = transition.state();

        if from == to {
            return TransitionOutcome::Unchanged;
        }
        if !from.can_transition_to(to) {
            return TransitionOutcome::Rejected { from, to };
        }

        match transition {
            Transition::Succeeded(result) => self.result = Some(result),
            Transition::Failed(reason) => self.failure_reason = Some(reason),
            Transition::Pending | Transition::Downloading => {}
        }
        self.state = to;

        TransitionOutcome::Applied { from, to }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task() -> Task {
        Task::new(
            TaskId::new("T1"),
            "https://example.com/watch?v=1",
            MediaKind::Audio,
            QualityTier::Good,
        )
    }

    fn song() -> TaskResult {
        TaskResult::new("song.mp3", Some(5_242_880), "http://svc/file/T1")
    }

    #[test]
    fn test_new_task_is_pending() {
        let t = task();
        assert_eq!(t.state, LifecycleState::Pending);
        assert!(t.result.is_none());
        assert!(t.failure_reason.is_none());
        assert!(!t.is_playable());
    }

    #[test]
    fn test_happy_path() {
        let mut t = task();
        assert!(t.apply(Transition::Downloading).is_applied());
        assert_eq!(
            t.apply(Transition::Succeeded(song())),
            TransitionOutcome::Applied {
                from: LifecycleState::Downloading,
                to: LifecycleState::Success
            }
        );
        assert_eq!(t.result.as_ref().map(|r| r.filename.as_str()), Some("song.mp3"));
        assert!(t.failure_reason.is_none());
        assert!(t.is_playable());
    }

    #[test]
    fn test_duplicate_success_is_idempotent() {
        let mut once = task();
        once.apply(Transition::Succeeded(song()));

        let mut twice = once.clone();
        let other = TaskResult::new("other.mp3", None, "x");
        assert_eq!(
            twice.apply(Transition::Succeeded(other)),
            TransitionOutcome::Unchanged
        );
        assert_eq!(once, twice);
    }

    #[test]
    fn test_no_exit_from_terminal() {
        let mut t = task();
        t.apply(Transition::Failed("boom".into()));

        assert_eq!(
            t.apply(Transition::Succeeded(song())),
            TransitionOutcome::Rejected {
                from: LifecycleState::Failure,
                to: LifecycleState::Success
            }
        );
        assert_eq!(t.state, LifecycleState::Failure);
        assert!(t.result.is_none());
        assert_eq!(t.failure_reason.as_deref(), Some("boom"));
    }

    #[test]
    fn test_stale_report_rejected() {
        let mut t = task();
        t.apply(Transition::Downloading);
        assert!(matches!(
            t.apply(Transition::Pending),
            TransitionOutcome::Rejected { .. }
        ));
        assert_eq!(t.state, LifecycleState::Downloading);
    }

    #[test]
    fn test_fast_job_skips_downloading() {
        let mut t = task();
        assert!(t.apply(Transition::Succeeded(song())).is_applied());
        assert_eq!(t.state, LifecycleState::Success);
    }
}
