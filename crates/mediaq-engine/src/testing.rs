//! Scripted in-memory service used by the engine's tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use mediaq_client::{ClientError, DownloadRequest, RemoteTaskService, ResultPayload, StatusReport};
use mediaq_core::TaskId;

/// One scripted answer to `task_status`.
#[derive(Debug, Clone)]
pub enum Reply {
    Report(StatusReport),
    Unreachable,
    Delayed(Duration, StatusReport),
}

impl Reply {
    pub fn status(state: &str) -> Self {
        Self::Report(StatusReport {
            state: state.to_string(),
            result: None,
            error: None,
        })
    }

    pub fn success(filename: &str, size: u64) -> Self {
        Self::Report(success_report(filename, size))
    }

    pub fn failure(reason: &str) -> Self {
        Self::Report(StatusReport {
            state: "FAILURE".to_string(),
            result: None,
            error: Some(reason.to_string()),
        })
    }

    pub fn delayed_success(delay: Duration) -> Self {
        Self::Delayed(delay, success_report("late.mp3", 1))
    }
}

fn success_report(filename: &str, size: u64) -> StatusReport {
    StatusReport {
        state: "SUCCESS".to_string(),
        result: Some(ResultPayload {
            filename: Some(filename.to_string()),
            size: Some(size),
            ..Default::default()
        }),
        error: None,
    }
}

/// Scripted answer to `create_task`.
#[derive(Debug, Clone)]
pub enum Submit {
    Accept(TaskId),
    Delayed(Duration, TaskId),
    Reject(u16, String),
    Unreachable,
}

/// Service whose answers are queued per task id. Unscripted probes fail as
/// if the service were unreachable.
pub struct ScriptedService {
    base_url: String,
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<HashMap<String, usize>>,
    submissions: Mutex<VecDeque<Submit>>,
    submit_calls: AtomicUsize,
    requests: Mutex<Vec<DownloadRequest>>,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self {
            base_url: "http://svc".to_string(),
            scripts: Mutex::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
            submissions: Mutex::new(VecDeque::new()),
            submit_calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn script(&self, task_id: &str, replies: impl IntoIterator<Item = Reply>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(task_id.to_string())
            .or_default()
            .extend(replies);
    }

    pub fn on_submit(&self, reply: Submit) {
        self.submissions.lock().unwrap().push_back(reply);
    }

    pub fn status_calls(&self, task_id: &str) -> usize {
        self.calls.lock().unwrap().get(task_id).copied().unwrap_or(0)
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<DownloadRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteTaskService for ScriptedService {
    async fn create_task(&self, request: &DownloadRequest) -> Result<TaskId, ClientError> {
        let n = self.submit_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests.lock().unwrap().push(request.clone());

        let reply = self.submissions.lock().unwrap().pop_front();
        match reply {
            Some(Submit::Accept(id)) => Ok(id),
            Some(Submit::Delayed(delay, id)) => {
                tokio::time::sleep(delay).await;
                Ok(id)
            }
            Some(Submit::Reject(status, message)) => Err(ClientError::Rejected { status, message }),
            Some(Submit::Unreachable) => Err(ClientError::Connection("connection refused".into())),
            None => Ok(TaskId::new(format!("task-{n}"))),
        }
    }

    async fn task_status(&self, task_id: &TaskId) -> Result<StatusReport, ClientError> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(task_id.to_string())
            .or_default() += 1;

        let reply = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(task_id.as_str())
            .and_then(|q| q.pop_front());

        match reply {
            Some(Reply::Report(report)) => Ok(report),
            Some(Reply::Delayed(delay, report)) => {
                tokio::time::sleep(delay).await;
                Ok(report)
            }
            Some(Reply::Unreachable) | None => {
                Err(ClientError::Connection("connection refused".into()))
            }
        }
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}
