//! The closed set of actions that may change client state.
//!
//! Actions are plain data. The reducer computes state from them and the
//! effect orchestrator reacts to them; neither ever sees anything else.

use tasksync_proto::cursor::PageToken;
use tasksync_proto::task::{RecordId, TaskRecord};

use crate::state::{TaskId, TaskPatch, TempId};

/// A request to change client state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Discard loaded tasks and fetch the first page.
    RequestReload,

    /// Fetch the page after the current cursor.
    RequestNextPage,

    /// A page fetch succeeded.
    PageReceived {
        /// Records on the page, in server order.
        items: Vec<TaskRecord>,
        /// Token of the following page, if any.
        cursor: Option<PageToken>,
        /// Load generation the fetch was issued under.
        generation: u64,
    },

    /// A page fetch failed.
    PageLoadFailed {
        /// Human-readable failure text.
        message: String,
        /// Load generation the fetch was issued under.
        generation: u64,
    },

    /// Replace the draft text.
    EditDraft {
        /// New draft text.
        text: String,
    },

    /// Empty the draft.
    ClearDraft,

    /// Insert an optimistic task built from the current draft.
    BeginCreate {
        /// Temporary id for the new task.
        temp_id: TempId,
    },

    /// The server stored the optimistic task under a permanent id.
    CreateConfirmed {
        /// Temporary id being replaced.
        temp_id: TempId,
        /// Server-assigned id.
        record_id: RecordId,
    },

    /// The server rejected the optimistic task or could not be reached.
    CreateFailed {
        /// Temporary id to roll back.
        temp_id: TempId,
        /// Failure text, for logs only.
        message: String,
    },

    /// Patch a task locally.
    EditTask {
        /// Task to patch.
        id: TaskId,
        /// Fields to replace.
        patch: TaskPatch,
    },

    /// Remove a task locally.
    DeleteTask {
        /// Task to remove.
        id: TaskId,
    },
}

/// Payload-free discriminant of an [`Action`], used to key effect handlers.
///
/// Each variant names the [`Action`] variant of the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionTag {
    /// [`Action::RequestReload`].
    RequestReload,
    /// [`Action::RequestNextPage`].
    RequestNextPage,
    /// [`Action::PageReceived`].
    PageReceived,
    /// [`Action::PageLoadFailed`].
    PageLoadFailed,
    /// [`Action::EditDraft`].
    EditDraft,
    /// [`Action::ClearDraft`].
    ClearDraft,
    /// [`Action::BeginCreate`].
    BeginCreate,
    /// [`Action::CreateConfirmed`].
    CreateConfirmed,
    /// [`Action::CreateFailed`].
    CreateFailed,
    /// [`Action::EditTask`].
    EditTask,
    /// [`Action::DeleteTask`].
    DeleteTask,
}

impl Action {
    /// Returns the tag of this action.
    #[must_use]
    pub const fn tag(&self) -> ActionTag {
        match self {
            Self::RequestReload => ActionTag::RequestReload,
            Self::RequestNextPage => ActionTag::RequestNextPage,
            Self::PageReceived { .. } => ActionTag::PageReceived,
            Self::PageLoadFailed { .. } => ActionTag::PageLoadFailed,
            Self::EditDraft { .. } => ActionTag::EditDraft,
            Self::ClearDraft => ActionTag::ClearDraft,
            Self::BeginCreate { .. } => ActionTag::BeginCreate,
            Self::CreateConfirmed { .. } => ActionTag::CreateConfirmed,
            Self::CreateFailed { .. } => ActionTag::CreateFailed,
            Self::EditTask { .. } => ActionTag::EditTask,
            Self::DeleteTask { .. } => ActionTag::DeleteTask,
        }
    }
}
