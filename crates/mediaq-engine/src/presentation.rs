//! Presentation sync: snapshots for the UI layer and the diffs between them.
//!
//! Rendering itself belongs to a [`Presenter`] supplied by the host. This
//! module decides *what* changed and only calls the presenter when
//! something did.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use mediaq_core::{LifecycleState, MediaKind, Task, TaskId};

use crate::playlist::PlaylistView;

/// Read-only state handed to the UI layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PresentationSnapshot {
    /// Every task in display order.
    pub tasks: Vec<Task>,
    /// Ids of the playable entries, in order.
    pub playlist: Vec<TaskId>,
    /// Playlist cursor.
    pub cursor: usize,
    /// Entry selected for playback.
    pub now_playing: Option<Task>,
}

impl PresentationSnapshot {
    /// Capture the registry's tasks together with the playlist state.
    pub fn capture(tasks: &[Task], view: &PlaylistView) -> Self {
        Self {
            tasks: tasks.to_vec(),
            playlist: view.entries().iter().map(|t| t.id.clone()).collect(),
            cursor: view.cursor(),
            now_playing: view.now_playing().cloned(),
        }
    }

    /// Number of tasks not yet finished.
    pub fn active_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.state.is_active()).count()
    }
}

/// Changes between two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresentationDiff {
    pub added: Vec<TaskId>,
    pub updated: Vec<TaskId>,
    pub removed: Vec<TaskId>,
    /// Playlist entries or cursor moved.
    pub playlist_changed: bool,
    pub now_playing_changed: bool,
}

impl PresentationDiff {
    /// Compute what changed from `old` to `new`.
    pub fn between(old: &PresentationSnapshot, new: &PresentationSnapshot) -> Self {
        let previous: HashMap<&TaskId, &Task> = old.tasks.iter().map(|t| (&t.id, t)).collect();
        let current: HashMap<&TaskId, &Task> = new.tasks.iter().map(|t| (&t.id, t)).collect();

        let mut diff = Self::default();
        for task in &new.tasks {
            match previous.get(&task.id) {
                None => diff.added.push(task.id.clone()),
                Some(before) if *before != task => diff.updated.push(task.id.clone()),
                Some(_) => {}
            }
        }
        diff.removed = old
            .tasks
            .iter()
            .filter(|t| !current.contains_key(&t.id))
            .map(|t| t.id.clone())
            .collect();

        diff.playlist_changed = old.playlist != new.playlist || old.cursor != new.cursor;
        diff.now_playing_changed = old.now_playing.as_ref().map(|t| &t.id)
            != new.now_playing.as_ref().map(|t| &t.id);
        diff
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.updated.is_empty()
            && self.removed.is_empty()
            && !self.playlist_changed
            && !self.now_playing_changed
    }
}

/// Rendering target supplied by the host environment.
pub trait Presenter: Send + Sync {
    /// Called with the new state and what changed since the last call.
    fn render(&self, snapshot: &PresentationSnapshot, diff: &PresentationDiff);
}

/// Presenter that renders nothing.
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn render(&self, _snapshot: &PresentationSnapshot, _diff: &PresentationDiff) {}
}

/// Presenter that writes changed rows to the log.
pub struct TracingPresenter;

impl Presenter for TracingPresenter {
    fn render(&self, snapshot: &PresentationSnapshot, diff: &PresentationDiff) {
        for task in snapshot
            .tasks
            .iter()
            .filter(|t| diff.added.contains(&t.id) || diff.updated.contains(&t.id))
        {
            debug!(task_id = %task.id, "{}", queue_line(task));
        }
        for id in &diff.removed {
            debug!(task_id = %id, "removed");
        }
        if diff.now_playing_changed {
            match &snapshot.now_playing {
                Some(task) => debug!(task_id = %task.id, "Now playing {}", playlist_line(task)),
                None => debug!("Nothing playing"),
            }
        }
    }
}

/// Keeps the last rendered snapshot and forwards changes to a presenter.
pub struct PresentationSync {
    presenter: Arc<dyn Presenter>,
    last: PresentationSnapshot,
}

impl PresentationSync {
    /// Create a new PresentationSync.
    pub fn new(presenter: Arc<dyn Presenter>) -> Self {
        Self {
            presenter,
            last: PresentationSnapshot::default(),
        }
    }

    /// Render `snapshot` if it differs from the last one. Returns true if
    /// the presenter was called.
    pub fn sync(&mut self, snapshot: PresentationSnapshot) -> bool {
        let diff = PresentationDiff::between(&self.last, &snapshot);
        if diff.is_empty() {
            return false;
        }
        self.presenter.render(&snapshot, &diff);
        self.last = snapshot;
        true
    }

    /// Last rendered snapshot.
    pub fn last(&self) -> &PresentationSnapshot {
        &self.last
    }
}

/// One queue row: kind, short id, quality, state and file name.
pub fn queue_line(task: &Task) -> String {
    let kind = match task.media_kind {
        MediaKind::Audio => "AUDIO",
        MediaKind::Video => "VIDEO",
    };
    let mut line = format!(
        "{} - {} | {} | {}",
        kind,
        task.id.short(),
        task.quality.description(),
        task.state.label()
    );
    match (task.state, &task.result, &task.failure_reason) {
        (LifecycleState::Success, Some(result), _) => {
            line.push_str(&format!(" | {} | {}", result.filename, result.locator));
        }
        (LifecycleState::Failure, _, Some(reason)) => {
            line.push_str(&format!(" | {}", reason));
        }
        _ => {}
    }
    line
}

/// One playlist row.
pub fn playlist_line(task: &Task) -> String {
    let name = task
        .result
        .as_ref()
        .map(|r| r.filename.as_str())
        .filter(|f| !f.is_empty())
        .unwrap_or("Loading...");
    format!("{} - {}", task.id.short(), name)
}
