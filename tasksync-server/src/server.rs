//! HTTP routes and server startup.
//!
//! The server exposes the task collection as a small REST resource:
//!
//! | Route | Behavior |
//! |---|---|
//! | `GET /tasks?pageSize&pageToken` | one page, newest first |
//! | `POST /tasks` | create, `201` with the stored record |
//! | `GET /tasks/{id}` | single record |
//! | `PATCH /tasks/{id}` | partial update |
//! | `DELETE /tasks/{id}` | remove, `204` |

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use tasksync_proto::task::{
    CreateTaskRequest, ListTasksQuery, ListTasksResponse, MAX_TASK_TEXT_LENGTH, RecordId,
    TaskResponse, UpdateTaskRequest,
};

use crate::config::ServerConfig;
use crate::error::{ApiErrorResponse, ValidationError};
use crate::pagination::{self, PageLimits, PageRequest};
use crate::store::TaskStore;

/// Shared server state: the record store and request limits.
pub struct ServerState {
    /// Task records.
    pub store: TaskStore,
    /// Page size bounds for listing.
    limits: PageLimits,
    /// Maximum task text length in characters.
    max_text_len: usize,
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerState {
    /// Creates a state with an empty store and default limits.
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: TaskStore::new(),
            limits: PageLimits::default(),
            max_text_len: MAX_TASK_TEXT_LENGTH,
        }
    }

    /// Creates a state with an empty store and limits from `config`.
    #[must_use]
    pub fn with_config(config: &ServerConfig) -> Self {
        Self {
            store: TaskStore::new(),
            limits: config.limits,
            max_text_len: config.max_text_len,
        }
    }

    /// Checks task text against the configured rules.
    fn validate_text(&self, text: &str) -> Result<(), ValidationError> {
        if text.trim().is_empty() {
            return Err(ValidationError::single("text", "must not be empty"));
        }
        if text.chars().count() > self.max_text_len {
            return Err(ValidationError::single(
                "text",
                format!("must be at most {} characters", self.max_text_len),
            ));
        }
        Ok(())
    }
}

/// Builds the router over the given state.
pub fn router(state: Arc<ServerState>) -> axum::Router {
    axum::Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route(
            "/tasks/{id}",
            get(get_task).patch(update_task).delete(delete_task),
        )
        .with_state(state)
}

/// Parses a path segment as a record id.
fn parse_id(raw: &str) -> Result<RecordId, ApiErrorResponse> {
    raw.parse::<RecordId>()
        .map_err(|e| ValidationError::single("id", e.to_string()).into())
}

async fn list_tasks(
    State(state): State<Arc<ServerState>>,
    query: Result<Query<ListTasksQuery>, QueryRejection>,
) -> Result<Json<ListTasksResponse>, ApiErrorResponse> {
    let Query(query) = query.map_err(|e| ApiErrorResponse::bad_request(e.body_text()))?;
    let request = PageRequest::parse(&query, state.limits)?;
    let page = pagination::fetch_page(&state.store, request).await;
    tracing::debug!(
        page_size = request.page_size,
        returned = page.items.len(),
        has_more = page.next_page_token.is_some(),
        "served task page"
    );
    Ok(Json(page))
}

async fn create_task(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TaskResponse>), ApiErrorResponse> {
    let Json(request) = payload.map_err(|e| ApiErrorResponse::bad_request(e.body_text()))?;
    state.validate_text(&request.text)?;
    let item = state.store.create(request.text).await;
    tracing::info!(id = %item.id, "task created");
    Ok((StatusCode::CREATED, Json(TaskResponse { item })))
}

async fn get_task(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> Result<Json<TaskResponse>, ApiErrorResponse> {
    let id = parse_id(&id)?;
    let item = state.store.get(id).await?;
    Ok(Json(TaskResponse { item }))
}

async fn update_task(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<Json<TaskResponse>, ApiErrorResponse> {
    let id = parse_id(&id)?;
    let Json(patch) = payload.map_err(|e| ApiErrorResponse::bad_request(e.body_text()))?;
    if let Some(text) = &patch.text {
        state.validate_text(text)?;
    }
    let item = state.store.update(id, &patch).await?;
    tracing::info!(id = %item.id, "task updated");
    Ok(Json(TaskResponse { item }))
}

async fn delete_task(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiErrorResponse> {
    let id = parse_id(&id)?;
    state.store.delete(id).await?;
    tracing::info!(id = %id, "task deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Starts the server on the given address and returns the bound address
/// and a join handle.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server(
    addr: &str,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    start_server_with_state(addr, Arc::new(ServerState::new())).await
}

/// Starts the server with a pre-configured [`ServerState`].
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server_with_state(
    addr: &str,
    state: Arc<ServerState>,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "server error");
        }
    });

    Ok((bound_addr, handle))
}

/// Starts the server in-process for testing on an OS-assigned port.
#[cfg(test)]
pub async fn start_test_server() -> (std::net::SocketAddr, tokio::task::JoinHandle<()>) {
    start_server("127.0.0.1:0")
        .await
        .expect("failed to start test server")
}
