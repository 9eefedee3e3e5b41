//! Terminal presenters for the download queue.

use std::io::Write;

use mediaq_engine::presentation::{playlist_line, queue_line};
use mediaq_engine::{PresentationDiff, PresentationSnapshot, Presenter};

/// Prints changed queue rows as plain text.
pub struct TerminalPresenter;

impl Presenter for TerminalPresenter {
    fn render(&self, snapshot: &PresentationSnapshot, diff: &PresentationDiff) {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();

        for task in snapshot
            .tasks
            .iter()
            .filter(|t| diff.added.contains(&t.id) || diff.updated.contains(&t.id))
        {
            let _ = writeln!(out, "{}", queue_line(task));
        }
        for id in &diff.removed {
            let _ = writeln!(out, "{} removed", id.short());
        }
        if diff.now_playing_changed {
            if let Some(task) = &snapshot.now_playing {
                let _ = writeln!(out, "> {}", playlist_line(task));
            }
        }
    }
}

/// Prints every snapshot as one JSON line.
pub struct JsonPresenter;

impl Presenter for JsonPresenter {
    fn render(&self, snapshot: &PresentationSnapshot, _diff: &PresentationDiff) {
        match serde_json::to_string(snapshot) {
            Ok(line) => println!("{}", line),
            Err(e) => tracing::warn!(error = %e, "Failed to encode snapshot"),
        }
    }
}
