//! Client library for the mediaq remote task service.
//!
//! Provides the [`RemoteTaskService`] seam the engine polls through, the wire
//! types of the service's JSON API, and a reqwest-backed [`HttpClient`].

pub mod error;
pub mod http;
pub mod service;
pub mod types;

pub use error::ClientError;
pub use http::HttpClient;
pub use service::RemoteTaskService;
pub use types::{DownloadAccepted, DownloadRequest, ErrorBody, ResultPayload, StatusReport};
