//! Engine configuration.

use std::time::Duration;

/// Default service address when the host supplies none.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// Shortest accepted delay between two status probes.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base address of the remote task service.
    pub api_base_url: String,

    /// Delay between two status probes of the same task.
    pub poll_interval: Duration,

    /// Consecutive failed probes tolerated before a task is force-failed.
    pub poll_budget: u32,

    /// Per-request HTTP timeout.
    pub request_timeout: Duration,

    /// Select the first playable entry automatically when nothing is playing.
    pub auto_select: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            poll_interval: Duration::from_secs(2),
            poll_budget: 300,
            request_timeout: Duration::from_secs(30),
            auto_select: true,
        }
    }
}

impl Config {
    /// Builder method to set the service address. Blank values keep the default.
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        let url = url.trim();
        if !url.is_empty() {
            self.api_base_url = url.trim_end_matches('/').to_string();
        }
        self
    }

    /// Builder method to set the poll interval. Clamped to [`MIN_POLL_INTERVAL`].
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    /// Builder method to set the poll budget.
    pub fn with_poll_budget(mut self, budget: u32) -> Self {
        self.poll_budget = budget.max(1);
        self
    }

    /// Builder method to set the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Builder method to toggle playlist auto-selection.
    pub fn with_auto_select(mut self, enabled: bool) -> Self {
        self.auto_select = enabled;
        self
    }
}
