//! Server access for the effect workflows.
//!
//! Defines the [`ApiClient`] trait the effects talk to. Implementations:
//! - [`http::HttpApiClient`] -- reqwest client for a running server
//! - [`scripted::ScriptedApiClient`] -- in-process queued responses for tests
//!
//! Both operations return the decoded JSON body untouched. Shape checks
//! happen in the effect workflows so that a malformed body becomes an
//! action rather than an error.

pub mod http;
pub mod scripted;

use tasksync_proto::cursor::PageToken;

/// Errors that can occur while calling the server.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    #[error("HTTP {status} {status_text}")]
    Status {
        /// Numeric status code.
        status: u16,
        /// Reason phrase, empty if unknown.
        status_text: String,
    },

    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// The response body was not JSON.
    #[error("failed to decode response body: {0}")]
    Decode(String),

    /// The configured server URL cannot be used.
    #[error("invalid server URL: {0}")]
    InvalidUrl(String),
}

impl From<url::ParseError> for ApiError {
    fn from(e: url::ParseError) -> Self {
        Self::InvalidUrl(e.to_string())
    }
}

/// Async access to the task endpoints.
pub trait ApiClient: Send + Sync + 'static {
    /// Fetch one page of tasks (`GET /tasks`).
    ///
    /// `page_token` is `None` for the first page.
    fn list_tasks(
        &self,
        page_size: u32,
        page_token: Option<&PageToken>,
    ) -> impl std::future::Future<Output = Result<serde_json::Value, ApiError>> + Send;

    /// Create a task (`POST /tasks`).
    fn create_task(
        &self,
        text: &str,
    ) -> impl std::future::Future<Output = Result<serde_json::Value, ApiError>> + Send;
}
