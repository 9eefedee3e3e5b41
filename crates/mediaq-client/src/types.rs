//! Wire types of the remote task service's JSON API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use mediaq_core::{MediaKind, QualityTier, TaskId};

/// Body of `POST /download`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadRequest {
    pub url: String,
    pub media_type: MediaKind,
    pub quality: QualityTier,
}

/// Successful answer to `POST /download`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DownloadAccepted {
    pub task_id: TaskId,
}

/// Error body the service sends with non-success statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub detail: Option<Value>,
}

/// Answer to `GET /status/{task_id}`.
///
/// `state` stays a raw string here; the engine parses it into
/// [`mediaq_core::RemoteStatus`] so unknown values can be reported.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusReport {
    pub state: String,
    #[serde(default)]
    pub result: Option<ResultPayload>,
    #[serde(default)]
    pub error: Option<String>,
}

/// `result` object of a successful status report.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResultPayload {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Pull a human-readable message out of an error response body.
///
/// Prefers `detail`, then the whole JSON body, then the raw text, and falls
/// back to a generic message when the body is empty.
pub fn error_message(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "server error".to_string();
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(json) => {
            let detail = serde_json::from_value::<ErrorBody>(json.clone())
                .ok()
                .and_then(|b| b.detail);
            match detail {
                Some(Value::String(s)) => s,
                Some(other) => other.to_string(),
                None => json.to_string(),
            }
        }
        Err(_) => trimmed.to_string(),
    }
}
