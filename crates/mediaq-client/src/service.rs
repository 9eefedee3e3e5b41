//! Contract of the remote task service.

use async_trait::async_trait;

use mediaq_core::TaskId;

use crate::error::ClientError;
use crate::types::{DownloadRequest, StatusReport};

/// Remote service that accepts jobs and reports their status.
///
/// The engine only talks to the service through this trait, so tests can
/// drive it with a scripted implementation.
#[async_trait]
pub trait RemoteTaskService: Send + Sync {
    /// Submit a job; returns the id the service assigned.
    async fn create_task(&self, request: &DownloadRequest) -> Result<TaskId, ClientError>;

    /// Fetch the current status of a job.
    async fn task_status(&self, task_id: &TaskId) -> Result<StatusReport, ClientError>;

    /// Base address of the service, for messages.
    fn base_url(&self) -> &str;

    /// Retrieval locator of a finished job's file. Never fetched by the engine.
    fn file_url(&self, task_id: &TaskId) -> String {
        format!("{}/file/{}", self.base_url(), task_id)
    }
}
