//! Read-only views derived from [`State`].

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tasksync_proto::cursor::PageToken;

use crate::state::{LoadStatus, State, Task, TaskId};

/// Current draft text.
#[must_use]
pub fn draft_text(state: &State) -> &str {
    &state.draft.text
}

/// Task with the given id, if present.
#[must_use]
pub fn task_by_id<'a>(state: &'a State, id: &TaskId) -> Option<&'a Task> {
    state.task_list.items.get(id)
}

/// All tasks sorted by ascending [`TaskId`].
///
/// Confirmed tasks come first in record-id order, then pending ones.
#[must_use]
pub fn ordered_tasks(state: &State) -> Vec<Task> {
    sorted(&state.task_list.items)
}

/// Current load status.
#[must_use]
pub const fn load_status(state: &State) -> LoadStatus {
    state.task_list.status
}

/// Token of the next page, if any.
#[must_use]
pub const fn next_page_cursor(state: &State) -> Option<&PageToken> {
    state.task_list.next_page_cursor.as_ref()
}

/// Whether the server reported more pages.
#[must_use]
pub const fn has_more(state: &State) -> bool {
    state.task_list.next_page_cursor.is_some()
}

/// Message of the last failed page load.
#[must_use]
pub fn last_error(state: &State) -> Option<&str> {
    state.task_list.last_error_message.as_deref()
}

/// Number of tasks still awaiting server confirmation.
#[must_use]
pub fn pending_count(state: &State) -> usize {
    state
        .task_list
        .items
        .values()
        .filter(|task| task.is_pending)
        .count()
}

fn sorted(items: &HashMap<TaskId, Task>) -> Vec<Task> {
    let mut tasks: Vec<Task> = items.values().cloned().collect();
    tasks.sort_by(|a, b| a.id.cmp(&b.id));
    tasks
}

/// Memoizing version of [`ordered_tasks`].
///
/// Recomputes only when the `items` map of the given state is a different
/// allocation from the one seen last, so repeated reads across actions that
/// leave the task list alone return the same `Arc`.
#[derive(Debug, Default)]
pub struct OrderedTasks {
    last: Mutex<Option<Memo>>,
}

#[derive(Debug)]
struct Memo {
    items: Arc<HashMap<TaskId, Task>>,
    ordered: Arc<[Task]>,
}

impl OrderedTasks {
    /// Creates an empty memo.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the ordered tasks of `state`.
    pub fn select(&self, state: &State) -> Arc<[Task]> {
        let mut last = self.last.lock();
        if let Some(memo) = last.as_ref()
            && Arc::ptr_eq(&memo.items, &state.task_list.items)
        {
            return Arc::clone(&memo.ordered);
        }
        let ordered: Arc<[Task]> = sorted(&state.task_list.items).into();
        *last = Some(Memo {
            items: Arc::clone(&state.task_list.items),
            ordered: Arc::clone(&ordered),
        });
        ordered
    }
}
