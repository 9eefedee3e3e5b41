//! HTTP client for the service's REST endpoints.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use mediaq_core::TaskId;

use crate::error::ClientError;
use crate::service::RemoteTaskService;
use crate::types::{error_message, DownloadAccepted, DownloadRequest, StatusReport};

/// HTTP client for the remote task service.
#[derive(Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    base_url: String,
}

impl HttpClient {
    /// Create a new HTTP client.
    pub fn new(base_url: &str) -> Self {
        Self {
            inner: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create a client whose requests give up after `timeout`.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let inner = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            inner,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Check if the service is healthy.
    pub async fn health(&self) -> Result<bool, ClientError> {
        let url = format!("{}/health", self.base_url);
        debug!(url = %url, "Checking health");

        let response = self
            .inner
            .get(&url)
            .send()
            .await
            .map_err(ClientError::from_transport)?;
        Ok(response.status().is_success())
    }

    /// Get JSON from an endpoint.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "GET request");

        let response = self
            .inner
            .get(&url)
            .send()
            .await
            .map_err(ClientError::from_transport)?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Rejected {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::Serialization(e.to_string()))
    }
}

#[async_trait]
impl RemoteTaskService for HttpClient {
    async fn create_task(&self, request: &DownloadRequest) -> Result<TaskId, ClientError> {
        let url = format!("{}/download", self.base_url);
        debug!(url = %url, media_type = %request.media_type, quality = %request.quality, "POST request");

        let response = self
            .inner
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(ClientError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Rejected {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let accepted: DownloadAccepted = response
            .json()
            .await
            .map_err(|e| ClientError::Serialization(e.to_string()))?;
        Ok(accepted.task_id)
    }

    async fn task_status(&self, task_id: &TaskId) -> Result<StatusReport, ClientError> {
        self.get_json(&format!("/status/{}", task_id)).await
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = HttpClient::new("http://localhost:8000/");
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[test]
    fn test_file_url() {
        let client = HttpClient::new("http://localhost:8000");
        assert_eq!(
            client.file_url(&TaskId::new("abc")),
            "http://localhost:8000/file/abc"
        );
    }

    #[tokio::test]
    async fn test_unreachable_service_is_connection_error() {
        // Port 9 (discard) on loopback is not expected to be listening.
        let client =
            HttpClient::with_timeout("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = client.task_status(&TaskId::new("t")).await.unwrap_err();
        assert!(matches!(err, ClientError::Connection(_)), "got {err:?}");
    }

    use mediaq_core::{MediaKind, QualityTier};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve exactly one request with a canned response and return the base URL.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request);
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text[..end]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= end + 4 + length {
                        break;
                    }
                }
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        format!("http://{}", addr)
    }

    fn request() -> DownloadRequest {
        DownloadRequest {
            url: "not a url".into(),
            media_type: MediaKind::Video,
            quality: QualityTier::P720,
        }
    }

    #[tokio::test]
    async fn test_create_task_rejection_carries_detail() {
        let base = serve_once("400 Bad Request", r#"{"detail":"Invalid URL format"}"#).await;
        let client = HttpClient::new(&base);

        let err = client.create_task(&request()).await.unwrap_err();
        match err {
            ClientError::Rejected { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid URL format");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_task_returns_assigned_id() {
        let base = serve_once("200 OK", r#"{"task_id":"3f2a9c1e"}"#).await;
        let client = HttpClient::new(&base);

        let id = client.create_task(&request()).await.unwrap();
        assert_eq!(id, TaskId::new("3f2a9c1e"));
    }

    #[tokio::test]
    async fn test_missing_status_is_not_found() {
        let base = serve_once("404 Not Found", r#"{"detail":"Task not found"}"#).await;
        let client = HttpClient::new(&base);

        let err = client.task_status(&TaskId::new("gone")).await.unwrap_err();
        assert!(matches!(err, ClientError::NotFound(_)), "got {err:?}");
    }
}
