//! Client state tree.
//!
//! [`State`] has two stored regions, the new-task [`Draft`] and the
//! [`TaskList`]. The ordered task sequence is derived on read (see
//! [`crate::selectors`]).
//!
//! `TaskList::items` sits behind an [`Arc`] so consecutive states share the
//! map when an action leaves it alone. The reducer replaces the `Arc` only
//! when the map actually changes.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tasksync_proto::cursor::PageToken;
use tasksync_proto::task::{RecordId, TaskRecord};
use uuid::Uuid;

/// Client-generated id of a task the server has not confirmed yet.
///
/// Unique per session; never sent to the server.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TempId(String);

impl TempId {
    /// Wraps an existing temporary id string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh time-ordered temporary id (`tmp-<uuid v7>`).
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("tmp-{}", Uuid::now_v7()))
    }

    /// Returns the id text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TempId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of a task in client state.
///
/// Variant order is significant: the derived ordering puts every permanent
/// id before every temporary one, so unconfirmed tasks sort last.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TaskId {
    /// Server-assigned id.
    Permanent(RecordId),
    /// Optimistic id awaiting confirmation.
    Temporary(TempId),
}

impl TaskId {
    /// Returns `true` for optimistic ids.
    #[must_use]
    pub const fn is_temporary(&self) -> bool {
        matches!(self, Self::Temporary(_))
    }
}

impl From<RecordId> for TaskId {
    fn from(id: RecordId) -> Self {
        Self::Permanent(id)
    }
}

impl From<TempId> for TaskId {
    fn from(id: TempId) -> Self {
        Self::Temporary(id)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Permanent(id) => write!(f, "{id}"),
            Self::Temporary(id) => write!(f, "{id}"),
        }
    }
}

/// A task as the client sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Current identity.
    pub id: TaskId,
    /// Task text.
    pub text: String,
    /// Whether the task is done.
    pub is_complete: bool,
    /// `true` only between optimistic creation and server confirmation.
    pub is_pending: bool,
}

impl From<TaskRecord> for Task {
    fn from(record: TaskRecord) -> Self {
        Self {
            id: TaskId::Permanent(record.id),
            text: record.text,
            is_complete: record.is_complete,
            is_pending: false,
        }
    }
}

/// Shallow patch for [`Task`]. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    /// Replacement text.
    pub text: Option<String>,
    /// Replacement completion flag.
    pub is_complete: Option<bool>,
}

impl TaskPatch {
    /// Writes the present fields into `task`.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(text) = &self.text {
            task.text.clone_from(text);
        }
        if let Some(is_complete) = self.is_complete {
            task.is_complete = is_complete;
        }
    }
}

/// Load state of the task list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadStatus {
    /// Nothing requested yet.
    #[default]
    Unloaded,
    /// A first-page fetch is in flight; the list was just cleared.
    Loading,
    /// A next-page fetch is in flight; loaded tasks are kept.
    LoadingMore,
    /// The last page fetch succeeded.
    Loaded,
    /// The last page fetch failed.
    Error,
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unloaded => write!(f, "unloaded"),
            Self::Loading => write!(f, "loading"),
            Self::LoadingMore => write!(f, "loading more"),
            Self::Loaded => write!(f, "loaded"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// In-progress input for a new task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    /// Text typed so far.
    pub text: String,
}

/// Accumulated tasks and pagination progress.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskList {
    /// Current load status.
    pub status: LoadStatus,
    /// Tasks keyed by id. At most one task per id.
    pub items: Arc<HashMap<TaskId, Task>>,
    /// Token of the next page; `None` when there is none.
    pub next_page_cursor: Option<PageToken>,
    /// Message of the last failed page load.
    pub last_error_message: Option<String>,
    /// Load generation. Bumped by every reload that starts a fetch; page
    /// results from an older generation are ignored.
    pub generation: u64,
}

/// The whole client state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct State {
    /// New-task input.
    pub draft: Draft,
    /// Task list region.
    pub task_list: TaskList,
}
