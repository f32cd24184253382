//! Pure state transitions.
//!
//! [`reduce`] never performs I/O and never mutates its input. Actions whose
//! precondition does not hold (an absent id, a next-page request without a
//! cursor, a page result from an older load generation) return a state
//! equal to the input and keep sharing its `items` map.

use std::sync::Arc;

use crate::actions::Action;
use crate::state::{LoadStatus, State, Task, TaskId};

/// Computes the state that follows `state` under `action`.
#[must_use]
pub fn reduce(state: &State, action: &Action) -> State {
    let mut next = state.clone();
    let list = &mut next.task_list;

    match action {
        Action::RequestReload => {
            // A reload already in flight serves this request too.
            if list.status != LoadStatus::Loading {
                list.generation = list.generation.wrapping_add(1);
            }
            list.status = LoadStatus::Loading;
            list.items = Arc::default();
            list.next_page_cursor = None;
            list.last_error_message = None;
        }
        Action::RequestNextPage => {
            if list.next_page_cursor.is_some()
                && !matches!(list.status, LoadStatus::Loading | LoadStatus::LoadingMore)
            {
                list.status = LoadStatus::LoadingMore;
            }
        }
        Action::PageReceived { generation, .. } | Action::PageLoadFailed { generation, .. }
            if *generation != list.generation =>
        {
            tracing::debug!(
                stale = *generation,
                current = list.generation,
                "dropping page result from an earlier load"
            );
        }
        Action::PageReceived { items, cursor, .. } => {
            if !items.is_empty() {
                let map = Arc::make_mut(&mut list.items);
                for record in items {
                    let task = Task::from(record.clone());
                    map.insert(task.id.clone(), task);
                }
            }
            list.status = LoadStatus::Loaded;
            list.next_page_cursor.clone_from(cursor);
            list.last_error_message = None;
        }
        Action::PageLoadFailed { message, .. } => {
            list.status = LoadStatus::Error;
            list.last_error_message = Some(message.clone());
        }
        Action::EditDraft { text } => {
            next.draft.text.clone_from(text);
        }
        Action::ClearDraft => {
            next.draft.text.clear();
        }
        Action::BeginCreate { temp_id } => {
            let id = TaskId::Temporary(temp_id.clone());
            let task = Task {
                id: id.clone(),
                text: state.draft.text.clone(),
                is_complete: false,
                is_pending: true,
            };
            Arc::make_mut(&mut list.items).insert(id, task);
        }
        Action::CreateConfirmed { temp_id, record_id } => {
            let temp = TaskId::Temporary(temp_id.clone());
            if list.items.contains_key(&temp) {
                let map = Arc::make_mut(&mut list.items);
                if let Some(mut task) = map.remove(&temp) {
                    let id = TaskId::Permanent(*record_id);
                    task.id = id.clone();
                    task.is_pending = false;
                    map.insert(id, task);
                }
            }
        }
        Action::CreateFailed { temp_id, .. } => {
            let temp = TaskId::Temporary(temp_id.clone());
            if list.items.contains_key(&temp) {
                Arc::make_mut(&mut list.items).remove(&temp);
            }
        }
        Action::EditTask { id, patch } => {
            if list.items.contains_key(id)
                && let Some(task) = Arc::make_mut(&mut list.items).get_mut(id)
            {
                patch.apply_to(task);
            }
        }
        Action::DeleteTask { id } => {
            if list.items.contains_key(id) {
                Arc::make_mut(&mut list.items).remove(id);
            }
        }
    }

    next
}
