//! Task registry: the single source of truth for every tracked task.
//!
//! The registry is a cheap cloneable handle. All mutations go through one
//! mutex and subscribers are called while it is held, so observers see
//! mutations one at a time and in the order they were applied.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use mediaq_core::{
    LifecycleState, MediaKind, QualityTier, Task, TaskId, Transition, TransitionOutcome,
};

use crate::error::EngineError;
use crate::poller::PollHandle;

/// Mutation that subscribers are told about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    Added(TaskId),
    Transitioned {
        id: TaskId,
        from: LifecycleState,
        to: LifecycleState,
    },
    Removed(TaskId),
}

impl RegistryEvent {
    /// Task the event is about.
    pub fn task_id(&self) -> &TaskId {
        match self {
            Self::Added(id) | Self::Removed(id) => id,
            Self::Transitioned { id, .. } => id,
        }
    }
}

/// Callback run after every committed mutation.
///
/// Receives the event and the full task list in display order. It runs with
/// the registry locked and must not call back into the registry.
pub type Subscriber = Box<dyn FnMut(&RegistryEvent, &[Task]) + Send>;

/// Result of asking for a poller slot.
#[derive(Debug)]
pub(crate) enum PollClaim {
    /// A poller is already running for the task.
    Existing(PollHandle),
    /// The caller owns a fresh handle and must start the loop.
    New(PollHandle),
}

struct Inner {
    /// Tasks in insertion order.
    tasks: Vec<Task>,
    /// Every id ever added, including removed ones.
    issued: HashSet<TaskId>,
    pollers: HashMap<TaskId, PollHandle>,
    subscribers: Vec<Subscriber>,
    next_generation: u64,
    shutdown: CancellationToken,
}

impl Inner {
    fn position(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| &t.id == id)
    }

    fn notify(&mut self, event: RegistryEvent) {
        for subscriber in self.subscribers.iter_mut() {
            subscriber(&event, &self.tasks);
        }
    }
}

/// In-memory, ordered collection of tasks.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<Mutex<Inner>>,
}

impl Registry {
    /// Create an empty registry with its own shutdown token.
    pub fn new() -> Self {
        Self::with_shutdown(CancellationToken::new())
    }

    /// Create an empty registry whose pollers stop when `shutdown` is cancelled.
    pub fn with_shutdown(shutdown: CancellationToken) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                tasks: Vec::new(),
                issued: HashSet::new(),
                pollers: HashMap::new(),
                subscribers: Vec::new(),
                next_generation: 0,
                shutdown,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a new pending task at the end of the queue.
    pub fn add(
        &self,
        id: TaskId,
        source_url: impl Into<String>,
        media_kind: MediaKind,
        quality: QualityTier,
    ) -> Result<Task, EngineError> {
        let mut inner = self.lock();
        if !inner.issued.insert(id.clone()) {
            return Err(EngineError::DuplicateTask(id));
        }

        let task = Task::new(id.clone(), source_url, media_kind, quality);
        inner.tasks.push(task.clone());
        info!(task_id = %id, media_type = %media_kind, quality = %quality, "Task added");

        inner.notify(RegistryEvent::Added(id));
        Ok(task)
    }

    /// Push a state update into a task.
    ///
    /// Returns `None` if the task is gone. Reports for terminal tasks and
    /// backward edges are absorbed; only applied transitions notify.
    pub fn transition(&self, id: &TaskId, transition: Transition) -> Option<TransitionOutcome> {
        let mut inner = self.lock();
        let Some(idx) = inner.position(id) else {
            debug!(task_id = %id, "Transition for unknown task ignored");
            return None;
        };

        let outcome = inner.tasks[idx].apply(transition);
        match outcome {
            TransitionOutcome::Applied { from, to } => {
                info!(task_id = %id, from = %from, to = %to, "Task state changed");
                inner.notify(RegistryEvent::Transitioned {
                    id: id.clone(),
                    from,
                    to,
                });
            }
            TransitionOutcome::Unchanged => {}
            TransitionOutcome::Rejected { from, to } => {
                debug!(task_id = %id, from = %from, to = %to, "Stale or post-terminal report discarded");
            }
        }
        Some(outcome)
    }

    /// Stop the task's poller and drop the task. Returns false if it was
    /// already gone.
    pub fn remove(&self, id: &TaskId) -> bool {
        let mut inner = self.lock();
        if let Some(handle) = inner.pollers.remove(id) {
            handle.release();
        }
        let Some(idx) = inner.position(id) else {
            return false;
        };

        inner.tasks.remove(idx);
        info!(task_id = %id, "Task removed");

        inner.notify(RegistryEvent::Removed(id.clone()));
        true
    }

    /// Register a callback for every committed mutation.
    pub fn subscribe<F>(&self, callback: F)
    where
        F: FnMut(&RegistryEvent, &[Task]) + Send + 'static,
    {
        self.lock().subscribers.push(Box::new(callback));
    }

    /// Snapshot of one task.
    pub fn get(&self, id: &TaskId) -> Option<Task> {
        let inner = self.lock();
        inner.position(id).map(|idx| inner.tasks[idx].clone())
    }

    /// Check if the task is still tracked.
    pub fn contains(&self, id: &TaskId) -> bool {
        self.lock().position(id).is_some()
    }

    /// All tasks in display order.
    pub fn snapshot(&self) -> Vec<Task> {
        self.lock().tasks.clone()
    }

    /// Number of tracked tasks.
    pub fn len(&self) -> usize {
        self.lock().tasks.len()
    }

    /// Check if no task is tracked.
    pub fn is_empty(&self) -> bool {
        self.lock().tasks.is_empty()
    }

    /// Current poll handle of a task, if one is active.
    pub fn poll_handle(&self, id: &TaskId) -> Option<PollHandle> {
        self.lock()
            .pollers
            .get(id)
            .filter(|h| h.is_active())
            .cloned()
    }

    /// Return the running poller's handle or install a new one.
    pub(crate) fn claim_poller(&self, id: &TaskId) -> Result<PollClaim, EngineError> {
        let mut inner = self.lock();
        if inner.position(id).is_none() {
            return Err(EngineError::TaskNotFound(id.clone()));
        }
        if let Some(existing) = inner.pollers.get(id).filter(|h| h.is_active()) {
            return Ok(PollClaim::Existing(existing.clone()));
        }

        inner.next_generation += 1;
        let handle = PollHandle::new(
            id.clone(),
            inner.next_generation,
            inner.shutdown.child_token(),
        );
        inner.pollers.insert(id.clone(), handle.clone());
        Ok(PollClaim::New(handle))
    }

    /// Release a poller's handle. A handle that was already replaced or
    /// removed only gets cancelled.
    pub(crate) fn release_poller(&self, handle: &PollHandle) {
        let mut inner = self.lock();
        let current = inner
            .pollers
            .get(handle.task_id())
            .is_some_and(|h| h.generation() == handle.generation());
        if current {
            inner.pollers.remove(handle.task_id());
        }
        handle.release();
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
