//! Task records and REST request/response bodies.
//!
//! All bodies are JSON with camelCase field names. A task's permanent id is
//! carried as a [`RecordId`], serialized as a fixed-width hex token so that
//! string order matches creation order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cursor::PageToken;

/// Maximum allowed task text length in characters.
pub const MAX_TASK_TEXT_LENGTH: usize = 256;

/// Page size used when a list request does not specify one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Number of hex digits in a serialized [`RecordId`].
const RECORD_ID_WIDTH: usize = 16;

/// Server-assigned permanent identifier of a task record.
///
/// Ids are allocated from a monotonically increasing counter, so comparing
/// two ids compares their creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(u64);

impl RecordId {
    /// Wraps a raw numeric id.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw numeric id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Error returned when a string is not a canonical [`RecordId`] token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid record id {0:?}: expected 16 lower-case hex digits")]
pub struct ParseRecordIdError(pub String);

impl FromStr for RecordId {
    type Err = ParseRecordIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let canonical = s.len() == RECORD_ID_WIDTH
            && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !canonical {
            return Err(ParseRecordIdError(s.to_string()));
        }
        u64::from_str_radix(s, 16)
            .map(Self)
            .map_err(|_| ParseRecordIdError(s.to_string()))
    }
}

impl TryFrom<String> for RecordId {
    type Error = ParseRecordIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.to_string()
    }
}

/// A task as stored by the server and sent over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    /// Permanent server-assigned id.
    pub id: RecordId,
    /// Task text.
    pub text: String,
    /// Whether the task has been completed.
    pub is_complete: bool,
}

/// Body of `POST /tasks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    /// Text of the new task.
    pub text: String,
}

/// Body of `PATCH /tasks/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    /// Replacement text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Replacement completion flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_complete: Option<bool>,
}

/// Response body carrying a single task (`POST`, `GET`, `PATCH`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResponse {
    /// The task.
    pub item: TaskRecord,
}

/// Query string of `GET /tasks`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksQuery {
    /// Requested page size; the server default applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    /// Resume token returned by the previous page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
}

/// Response body of `GET /tasks`.
///
/// `next_page_token` is always serialized, as `null` on the last page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksResponse {
    /// Tasks in this page, newest first.
    pub items: Vec<TaskRecord>,
    /// Token for the following page, if any.
    pub next_page_token: Option<PageToken>,
}

/// Field-level detail of a validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Name of the offending field, as it appears on the wire.
    pub field: String,
    /// What was wrong with it.
    pub message: String,
}

impl FieldError {
    /// Creates a new field error.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// JSON body of every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error code (`VALIDATION_ERROR`, `NOT_FOUND`, ...).
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Offending fields for validation errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}
