//! Playable-media view: completed audio/video tasks plus a play cursor.

use mediaq_core::{Task, TaskId};

/// Tasks that can be played, in registry order.
pub fn playable(tasks: &[Task]) -> Vec<Task> {
    tasks.iter().filter(|t| t.is_playable()).cloned().collect()
}

/// Derived playlist with explicit cursor and selection.
///
/// Entries are only ever replaced wholesale by [`PlaylistView::recompute`].
#[derive(Debug, Clone, Default)]
pub struct PlaylistView {
    entries: Vec<Task>,
    cursor: usize,
    now_playing: Option<TaskId>,
    auto_select: bool,
}

impl PlaylistView {
    /// Create an empty view. With `auto_select`, the first entry starts
    /// playing whenever something new arrives while nothing is selected.
    pub fn new(auto_select: bool) -> Self {
        Self {
            auto_select,
            ..Default::default()
        }
    }

    /// Rebuild the entries from the registry's task list.
    pub fn recompute(&mut self, tasks: &[Task]) {
        let before: Vec<TaskId> = self.entries.iter().map(|t| t.id.clone()).collect();
        self.entries = playable(tasks);

        if self.entries.is_empty() {
            self.cursor = 0;
            self.now_playing = None;
            return;
        }

        // Follow the selected task to its new position.
        if let Some(id) = &self.now_playing {
            match self.index_of(id) {
                Some(idx) => self.cursor = idx,
                None => self.now_playing = None,
            }
        }
        self.cursor = self.cursor.min(self.entries.len() - 1);

        if self.auto_select && self.now_playing.is_none() {
            let arrived = self.entries.iter().any(|t| !before.contains(&t.id));
            if arrived {
                self.cursor = 0;
                self.now_playing = Some(self.entries[0].id.clone());
            }
        }
    }

    /// Advance to the next entry, wrapping at the end.
    pub fn next(&mut self) -> Option<&Task> {
        if self.entries.is_empty() {
            self.cursor = 0;
            return None;
        }
        let idx = (self.cursor + 1) % self.entries.len();
        self.play_index(idx)
    }

    /// Go back one entry, wrapping at the start.
    pub fn previous(&mut self) -> Option<&Task> {
        if self.entries.is_empty() {
            self.cursor = 0;
            return None;
        }
        let len = self.entries.len();
        let idx = (self.cursor + len - 1) % len;
        self.play_index(idx)
    }

    /// Play a specific entry. `None` if the task is not playable.
    pub fn select(&mut self, id: &TaskId) -> Option<&Task> {
        let idx = self.index_of(id)?;
        self.play_index(idx)
    }

    /// Entry currently selected for playback.
    pub fn now_playing(&self) -> Option<&Task> {
        let id = self.now_playing.as_ref()?;
        self.entries.iter().find(|t| &t.id == id)
    }

    /// Current cursor position.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Entries in playback order.
    pub fn entries(&self) -> &[Task] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn index_of(&self, id: &TaskId) -> Option<usize> {
        self.entries.iter().position(|t| &t.id == id)
    }

    fn play_index(&mut self, idx: usize) -> Option<&Task> {
        self.cursor = idx;
        let task = &self.entries[idx];
        self.now_playing = Some(task.id.clone());
        Some(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediaq_core::{MediaKind, QualityTier, TaskResult, Transition};

    fn task(id: &str, kind: MediaKind) -> Task {
        Task::new(TaskId::new(id), "u", kind, QualityTier::default_for(kind))
    }

    fn done(id: &str, kind: MediaKind) -> Task {
        let mut t = task(id, kind);
        t.apply(Transition::Succeeded(TaskResult::new(
            format!("{id}.bin"),
            None,
            format!("http://svc/file/{id}"),
        )));
        t
    }

    fn ids(view: &PlaylistView) -> Vec<&str> {
        view.entries().iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn test_playable_filters_and_keeps_order() {
        let mut failed = task("F", MediaKind::Audio);
        failed.apply(Transition::Failed("x".into()));
        let tasks = vec![
            done("A", MediaKind::Video),
            task("P", MediaKind::Audio),
            failed,
            done("B", MediaKind::Audio),
        ];
        let ids: Vec<_> = playable(&tasks).into_iter().map(|t| t.id.into_inner()).collect();
        assert_eq!(ids, vec!["A", "B"]);
    }

    #[test]
    fn test_out_of_order_completion_keeps_submission_order() {
        let mut view = PlaylistView::new(true);
        let mut tasks = vec![task("T1", MediaKind::Video), done("T2", MediaKind::Audio)];

        view.recompute(&tasks);
        assert_eq!(ids(&view), vec!["T2"]);
        assert_eq!(view.now_playing().map(|t| t.id.as_str()), Some("T2"));

        tasks[0] = done("T1", MediaKind::Video);
        view.recompute(&tasks);
        assert_eq!(ids(&view), vec!["T1", "T2"]);
        // Selection follows T2 to its new index.
        assert_eq!(view.now_playing().map(|t| t.id.as_str()), Some("T2"));
        assert_eq!(view.cursor(), 1);
    }

    #[test]
    fn test_navigation_wraps() {
        let mut view = PlaylistView::new(true);
        let tasks = vec![
            done("A", MediaKind::Audio),
            done("B", MediaKind::Video),
            done("C", MediaKind::Audio),
        ];
        view.recompute(&tasks);
        assert_eq!(view.cursor(), 0);

        assert_eq!(view.previous().map(|t| t.id.as_str()), Some("C"));
        assert_eq!(view.next().map(|t| t.id.as_str()), Some("A"));
        assert_eq!(view.next().map(|t| t.id.as_str()), Some("B"));
        assert_eq!(view.cursor(), 1);
    }

    #[test]
    fn test_empty_view_navigation() {
        let mut view = PlaylistView::new(true);
        assert!(view.next().is_none());
        assert!(view.previous().is_none());
        assert_eq!(view.cursor(), 0);
        assert!(view.now_playing().is_none());
    }

    #[test]
    fn test_emptied_view_resets_cursor() {
        let mut view = PlaylistView::new(true);
        view.recompute(&[done("A", MediaKind::Audio), done("B", MediaKind::Audio)]);
        view.next();
        assert_eq!(view.cursor(), 1);

        view.recompute(&[]);
        assert_eq!(view.cursor(), 0);
        assert!(view.now_playing().is_none());
        assert!(view.is_empty());
    }

    #[test]
    fn test_removed_selection_clamps_cursor() {
        let mut view = PlaylistView::new(true);
        view.recompute(&[
            done("A", MediaKind::Audio),
            done("B", MediaKind::Audio),
            done("C", MediaKind::Audio),
        ]);
        view.select(&TaskId::new("C"));
        assert_eq!(view.cursor(), 2);

        view.recompute(&[done("A", MediaKind::Audio), done("B", MediaKind::Audio)]);
        assert_eq!(view.cursor(), 1);
        assert!(view.now_playing().is_none());
    }

    #[test]
    fn test_without_auto_select() {
        let mut view = PlaylistView::new(false);
        view.recompute(&[done("A", MediaKind::Audio)]);
        assert_eq!(view.len(), 1);
        assert!(view.now_playing().is_none());

        assert_eq!(
            view.select(&TaskId::new("A")).map(|t| t.id.as_str()),
            Some("A")
        );
        assert!(view.select(&TaskId::new("missing")).is_none());
    }
}
