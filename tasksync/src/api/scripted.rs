//! In-process [`ApiClient`] with queued responses.
//!
//! Each operation pops the next response pushed for it and records the call.
//! A response may be gated on a [`oneshot`] signal so tests can hold a
//! request open and release several in any order. An empty queue answers
//! with [`ApiError::Network`].

use std::collections::VecDeque;

use parking_lot::Mutex;
use serde_json::Value;
use tasksync_proto::cursor::PageToken;
use tokio::sync::oneshot;

use super::{ApiClient, ApiError};

/// A recorded call against [`ScriptedApiClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    /// `list_tasks(page_size, page_token)`.
    ListTasks {
        /// Requested page size.
        page_size: u32,
        /// Requested token.
        page_token: Option<PageToken>,
    },
    /// `create_task(text)`.
    CreateTask {
        /// Submitted text.
        text: String,
    },
}

struct Scripted {
    gate: Option<oneshot::Receiver<()>>,
    result: Result<Value, ApiError>,
}

/// Test double answering from per-operation response queues.
#[derive(Default)]
pub struct ScriptedApiClient {
    list_responses: Mutex<VecDeque<Scripted>>,
    create_responses: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<ApiCall>>,
}

impl ScriptedApiClient {
    /// Creates a client with empty queues.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the next `list_tasks` result.
    pub fn push_list(&self, result: Result<Value, ApiError>) {
        self.list_responses
            .lock()
            .push_back(Scripted { gate: None, result });
    }

    /// Queues the next `create_task` result.
    pub fn push_create(&self, result: Result<Value, ApiError>) {
        self.create_responses
            .lock()
            .push_back(Scripted { gate: None, result });
    }

    /// Queues the next `list_tasks` result, held back until the returned
    /// sender fires (or is dropped).
    pub fn push_list_gated(&self, result: Result<Value, ApiError>) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.list_responses.lock().push_back(Scripted {
            gate: Some(rx),
            result,
        });
        tx
    }

    /// Queues the next `create_task` result, held back until the returned
    /// sender fires (or is dropped).
    pub fn push_create_gated(&self, result: Result<Value, ApiError>) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.create_responses.lock().push_back(Scripted {
            gate: Some(rx),
            result,
        });
        tx
    }

    /// Every call received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().clone()
    }

    /// Number of `list_tasks` calls received.
    #[must_use]
    pub fn list_calls(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, ApiCall::ListTasks { .. }))
            .count()
    }

    /// Number of `create_task` calls received.
    #[must_use]
    pub fn create_calls(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, ApiCall::CreateTask { .. }))
            .count()
    }
}

async fn answer(next: Option<Scripted>) -> Result<Value, ApiError> {
    let Some(Scripted { gate, result }) = next else {
        return Err(ApiError::Network("no scripted response".to_string()));
    };
    if let Some(gate) = gate {
        // A dropped sender releases the response too.
        let _ = gate.await;
    }
    result
}

impl ApiClient for ScriptedApiClient {
    async fn list_tasks(
        &self,
        page_size: u32,
        page_token: Option<&PageToken>,
    ) -> Result<Value, ApiError> {
        self.calls.lock().push(ApiCall::ListTasks {
            page_size,
            page_token: page_token.cloned(),
        });
        let next = self.list_responses.lock().pop_front();
        answer(next).await
    }

    async fn create_task(&self, text: &str) -> Result<Value, ApiError> {
        self.calls.lock().push(ApiCall::CreateTask {
            text: text.to_string(),
        });
        let next = self.create_responses.lock().pop_front();
        answer(next).await
    }
}
