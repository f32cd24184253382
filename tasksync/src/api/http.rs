//! reqwest-backed [`ApiClient`].

use reqwest::Response;
use serde_json::Value;
use tasksync_proto::cursor::PageToken;
use tasksync_proto::task::{CreateTaskRequest, ListTasksQuery};
use url::Url;

use super::{ApiClient, ApiError};

/// HTTP client for a tasksync server.
#[derive(Debug, Clone)]
pub struct HttpApiClient {
    client: reqwest::Client,
    tasks_url: Url,
}

impl HttpApiClient {
    /// Creates a client for the server at `base_url` (e.g. `http://127.0.0.1:8080`).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidUrl`] if `base_url` is not an absolute
    /// http(s) URL.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let mut base = Url::parse(base_url)?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ApiError::InvalidUrl(format!(
                "unsupported scheme {}",
                base.scheme()
            )));
        }
        // Keep any path prefix when joining.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            client: reqwest::Client::new(),
            tasks_url: base.join("tasks")?,
        })
    }

    /// URL of the task collection.
    #[must_use]
    pub const fn tasks_url(&self) -> &Url {
        &self.tasks_url
    }
}

/// Maps a response to its JSON body or an [`ApiError::Status`].
///
/// A success whose body is not JSON yields `Value::Null`, which the
/// workflows treat like any other unexpected shape. Only a body that cannot
/// be read at all is an [`ApiError::Decode`].
async fn read_json(response: Response) -> Result<Value, ApiError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::Status {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
        });
    }
    let body = response
        .bytes()
        .await
        .map_err(|e| ApiError::Decode(e.to_string()))?;
    match serde_json::from_slice::<Value>(&body) {
        Ok(value) => Ok(value),
        Err(e) => {
            tracing::warn!(
                status = status.as_u16(),
                len = body.len(),
                error = %e,
                "success response body is not JSON"
            );
            Ok(Value::Null)
        }
    }
}

impl ApiClient for HttpApiClient {
    async fn list_tasks(
        &self,
        page_size: u32,
        page_token: Option<&PageToken>,
    ) -> Result<Value, ApiError> {
        let query = ListTasksQuery {
            page_size: Some(page_size),
            page_token: page_token.map(|t| t.as_str().to_string()),
        };
        let response = self
            .client
            .get(self.tasks_url.clone())
            .query(&query)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        read_json(response).await
    }

    async fn create_task(&self, text: &str) -> Result<Value, ApiError> {
        let response = self
            .client
            .post(self.tasks_url.clone())
            .json(&CreateTaskRequest {
                text: text.to_string(),
            })
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        read_json(response).await
    }
}
