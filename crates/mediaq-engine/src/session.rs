//! Session: the submission flow and everything derived from the registry.
//!
//! A session owns one registry, starts a poller for each accepted task and
//! keeps the playlist and the presentation in step with the registry through
//! a single subscriber.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use mediaq_client::{ClientError, DownloadRequest, RemoteTaskService};
use mediaq_core::{CoreError, LifecycleState, MediaKind, QualityTier, Task, TaskId};

use crate::config::Config;
use crate::error::EngineError;
use crate::playlist::PlaylistView;
use crate::poller::Poller;
use crate::presentation::{PresentationSnapshot, PresentationSync, Presenter};
use crate::registry::Registry;

/// State derived from the registry, updated under the registry's lock.
struct Derived {
    tasks: Vec<Task>,
    view: PlaylistView,
    presentation: PresentationSync,
}

impl Derived {
    fn refresh(&mut self) {
        let snapshot = PresentationSnapshot::capture(&self.tasks, &self.view);
        self.presentation.sync(snapshot);
    }
}

/// One user session of the download queue.
pub struct Session {
    service: Arc<dyn RemoteTaskService>,
    registry: Registry,
    poller: Poller,
    derived: Arc<Mutex<Derived>>,
    active: watch::Receiver<usize>,
    shutdown: CancellationToken,
}

fn lock(derived: &Mutex<Derived>) -> MutexGuard<'_, Derived> {
    derived.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Session {
    /// Create a session talking to `service` and rendering through `presenter`.
    pub fn new(
        config: Config,
        service: Arc<dyn RemoteTaskService>,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        let shutdown = CancellationToken::new();
        let registry = Registry::with_shutdown(shutdown.clone());
        let poller = Poller::new(service.clone(), registry.clone(), &config);

        let derived = Arc::new(Mutex::new(Derived {
            tasks: Vec::new(),
            view: PlaylistView::new(config.auto_select),
            presentation: PresentationSync::new(presenter),
        }));
        let (active_tx, active) = watch::channel(0usize);

        let sink = derived.clone();
        registry.subscribe(move |_event, tasks| {
            let mut derived = lock(&sink);
            derived.tasks = tasks.to_vec();
            derived.view.recompute(tasks);
            derived.refresh();
            active_tx.send_replace(tasks.iter().filter(|t| t.state.is_active()).count());
        });

        Self {
            service,
            registry,
            poller,
            derived,
            active,
            shutdown,
        }
    }

    /// Submit a job and start tracking it.
    ///
    /// Only validation and submission failures are returned; anything that
    /// happens while polling shows up as the task's state.
    pub async fn submit(
        &self,
        source_url: &str,
        media_kind: MediaKind,
        quality: QualityTier,
    ) -> Result<Task, EngineError> {
        let url = source_url.trim();
        if url.is_empty() {
            return Err(CoreError::InvalidInput("Please enter a URL".to_string()).into());
        }
        if quality.media_kind() != media_kind {
            return Err(CoreError::UnknownQuality {
                kind: media_kind.to_string(),
                quality: quality.to_string(),
            }
            .into());
        }

        let request = DownloadRequest {
            url: url.to_string(),
            media_type: media_kind,
            quality,
        };
        info!(media_type = %media_kind, quality = %quality, "Submitting download");

        let id = self
            .service
            .create_task(&request)
            .await
            .map_err(|e| self.submission_error(e))?;

        let task = self.registry.add(id.clone(), url, media_kind, quality)?;
        self.poller.attach(&id)?;
        info!(task_id = %id, short_id = %id.short(), "Download added to queue");
        Ok(task)
    }

    fn submission_error(&self, err: ClientError) -> EngineError {
        let message = match err {
            ClientError::Rejected { message, .. } => message,
            ClientError::Connection(e) => format!(
                "failed to reach API at {}: {}",
                self.service.base_url(),
                e
            ),
            other => other.to_string(),
        };
        warn!(error = %message, "Submission failed");
        EngineError::Submission(message)
    }

    /// Stop tracking a task. Idempotent.
    pub fn remove(&self, id: &TaskId) -> bool {
        self.registry.remove(id)
    }

    /// Resubmit a failed task with the same parameters.
    ///
    /// The failed entry is dropped only once the new submission is accepted.
    pub async fn retry(&self, id: &TaskId) -> Result<Task, EngineError> {
        let failed = self
            .registry
            .get(id)
            .ok_or_else(|| EngineError::TaskNotFound(id.clone()))?;
        if failed.state != LifecycleState::Failure {
            return Err(EngineError::Validation(format!(
                "task {} has not failed",
                id.short()
            )));
        }

        let task = self
            .submit(&failed.source_url, failed.media_kind, failed.quality)
            .await?;
        self.registry.remove(id);
        info!(task_id = %id, new_task_id = %task.id, "Task resubmitted");
        Ok(task)
    }

    /// Play the next playlist entry.
    pub fn next(&self) -> Option<Task> {
        let mut derived = lock(&self.derived);
        let task = derived.view.next().cloned();
        derived.refresh();
        task
    }

    /// Play the previous playlist entry.
    pub fn previous(&self) -> Option<Task> {
        let mut derived = lock(&self.derived);
        let task = derived.view.previous().cloned();
        derived.refresh();
        task
    }

    /// Play a specific completed task.
    pub fn play(&self, id: &TaskId) -> Option<Task> {
        let mut derived = lock(&self.derived);
        let task = derived.view.select(id).cloned();
        derived.refresh();
        task
    }

    /// Entry selected for playback.
    pub fn now_playing(&self) -> Option<Task> {
        lock(&self.derived).view.now_playing().cloned()
    }

    /// Playable entries in order.
    pub fn playlist(&self) -> Vec<Task> {
        lock(&self.derived).view.entries().to_vec()
    }

    /// All tasks in display order.
    pub fn tasks(&self) -> Vec<Task> {
        self.registry.snapshot()
    }

    /// One task.
    pub fn task(&self, id: &TaskId) -> Option<Task> {
        self.registry.get(id)
    }

    /// Last state handed to the presenter. Always matches the registry.
    pub fn snapshot(&self) -> PresentationSnapshot {
        lock(&self.derived).presentation.last().clone()
    }

    /// Where a finished task's file can be fetched.
    pub fn file_url(&self, id: &TaskId) -> String {
        self.service.file_url(id)
    }

    /// The underlying registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Resolve once every tracked task has reached a terminal state.
    pub async fn wait_until_settled(&self) {
        let mut active = self.active.clone();
        // The sender lives as long as the registry, which outlives `self`.
        let _ = active.wait_for(|count| *count == 0).await;
    }

    /// Stop every poller. Tasks stay in the registry.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
