//! Integration tests for the reload, next-page and create workflows.
//!
//! Drives a [`Store`] over a `ScriptedApiClient`, so every server answer
//! (including malformed ones) is chosen by the test and every request is
//! recorded.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use serde_json::{Value, json};
use tasksync::api::ApiError;
use tasksync::api::scripted::{ApiCall, ScriptedApiClient};
use tasksync::{Action, ActionTag, EngineConfig, LoadStatus, Store, TaskId, TempId};
use tasksync_proto::cursor;
use tasksync_proto::task::RecordId;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn store_with_page_size(page_size: u32) -> Store<ScriptedApiClient> {
    Store::new(
        ScriptedApiClient::new(),
        EngineConfig {
            page_size,
            ..EngineConfig::default()
        },
    )
}

fn store() -> Store<ScriptedApiClient> {
    store_with_page_size(20)
}

fn task_json(id: u64, text: &str) -> Value {
    json!({"id": RecordId::new(id).to_string(), "text": text, "isComplete": false})
}

fn created(id: u64, text: &str) -> Result<Value, ApiError> {
    Ok(json!({"item": task_json(id, text)}))
}

fn drain_tags(rx: &mut broadcast::Receiver<Action>) -> Vec<ActionTag> {
    let mut tags = Vec::new();
    while let Ok(action) = rx.try_recv() {
        tags.push(action.tag());
    }
    tags
}

/// Waits until an action matching `pred` comes through the stream.
async fn wait_for(rx: &mut broadcast::Receiver<Action>, pred: impl Fn(&Action) -> bool) {
    loop {
        let action = rx.recv().await.unwrap();
        if pred(&action) {
            return;
        }
    }
}

/// Submits `text` as a new task and waits until its create request has been
/// issued, so queued create responses pair up with submissions in order.
async fn submit(store: &Store<ScriptedApiClient>, text: &str) -> TempId {
    let issued = store.api().create_calls();
    store.dispatch(Action::EditDraft {
        text: text.to_string(),
    });
    let temp_id = store.submit_draft();
    while store.api().create_calls() == issued {
        tokio::task::yield_now().await;
    }
    temp_id
}

// ---------------------------------------------------------------------------
// Reload
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_list_loads() {
    let store = store();
    store
        .api()
        .push_list(Ok(json!({"items": [], "nextPageToken": null})));

    store.dispatch(Action::RequestReload);
    assert_eq!(store.state().task_list.status, LoadStatus::Loading);
    store.settle().await;

    let state = store.state();
    assert_eq!(state.task_list.status, LoadStatus::Loaded);
    assert!(state.task_list.items.is_empty());
    assert_eq!(state.task_list.next_page_cursor, None);
    assert_eq!(
        store.api().calls(),
        vec![ApiCall::ListTasks {
            page_size: 20,
            page_token: None,
        }]
    );
}

#[tokio::test]
async fn second_reload_while_loading_is_suppressed() {
    let store = store();
    store
        .api()
        .push_list(Ok(json!({"items": [task_json(1, "a")], "nextPageToken": null})));

    store.dispatch(Action::RequestReload);
    store.dispatch(Action::RequestReload);
    store.settle().await;

    assert_eq!(store.api().list_calls(), 1);
    assert_eq!(store.state().task_list.status, LoadStatus::Loaded);
    assert_eq!(store.state().task_list.items.len(), 1);
}

#[tokio::test]
async fn missing_items_is_empty_last_page() {
    let store = store();
    store
        .api()
        .push_list(Ok(json!({"nextPageToken": cursor::encode(RecordId::new(1))})));

    store.dispatch(Action::RequestReload);
    store.settle().await;

    let state = store.state();
    assert_eq!(state.task_list.status, LoadStatus::Loaded);
    assert!(state.task_list.items.is_empty());
    assert_eq!(state.task_list.next_page_cursor, None);
}

#[tokio::test]
async fn absent_cursor_means_no_more_pages() {
    let store = store();
    store
        .api()
        .push_list(Ok(json!({"items": [task_json(2, "b"), task_json(1, "a")]})));

    store.dispatch(Action::RequestReload);
    store.settle().await;

    let state = store.state();
    assert_eq!(state.task_list.items.len(), 2);
    assert_eq!(state.task_list.next_page_cursor, None);
}

#[tokio::test]
async fn failed_reload_sets_error() {
    let store = store();
    store.api().push_list(Err(ApiError::Status {
        status: 503,
        status_text: "Service Unavailable".to_string(),
    }));
    let mut actions = store.actions();

    store.dispatch(Action::RequestReload);
    store.settle().await;

    let state = store.state();
    assert_eq!(state.task_list.status, LoadStatus::Error);
    assert_eq!(
        state.task_list.last_error_message.as_deref(),
        Some("HTTP 503 Service Unavailable")
    );
    assert_eq!(
        drain_tags(&mut actions),
        vec![ActionTag::RequestReload, ActionTag::PageLoadFailed]
    );
}

// ---------------------------------------------------------------------------
// Next page
// ---------------------------------------------------------------------------

#[tokio::test]
async fn next_page_accumulates_with_trigger_time_cursor() {
    let store = store_with_page_size(2);
    let token = cursor::encode(RecordId::new(1));
    store.api().push_list(Ok(json!({
        "items": [task_json(3, "c"), task_json(2, "b")],
        "nextPageToken": token.clone(),
    })));
    store
        .api()
        .push_list(Ok(json!({"items": [task_json(1, "a")], "nextPageToken": null})));

    store.dispatch(Action::RequestReload);
    store.settle().await;
    assert_eq!(store.state().task_list.next_page_cursor, Some(token.clone()));

    store.dispatch(Action::RequestNextPage);
    store.settle().await;

    let state = store.state();
    assert_eq!(state.task_list.items.len(), 3);
    assert_eq!(state.task_list.next_page_cursor, None);
    assert_eq!(
        store.api().calls()[1],
        ApiCall::ListTasks {
            page_size: 2,
            page_token: Some(token),
        }
    );
}

#[tokio::test]
async fn next_page_without_cursor_is_suppressed() {
    let store = store();
    store
        .api()
        .push_list(Ok(json!({"items": [], "nextPageToken": null})));

    store.dispatch(Action::RequestReload);
    store.settle().await;
    store.dispatch(Action::RequestNextPage);
    store.settle().await;

    assert_eq!(store.api().list_calls(), 1);
    assert_eq!(store.state().task_list.status, LoadStatus::Loaded);
}

#[tokio::test]
async fn next_page_during_reload_is_suppressed() {
    let store = store();
    store.api().push_list(Ok(json!({
        "items": [task_json(2, "b")],
        "nextPageToken": cursor::encode(RecordId::new(1)),
    })));

    store.dispatch(Action::RequestReload);
    store.dispatch(Action::RequestNextPage);
    store.settle().await;

    assert_eq!(store.api().list_calls(), 1);
}

#[tokio::test]
async fn reload_during_next_page_refetches_first_page() {
    let store = store_with_page_size(2);
    let token = cursor::encode(RecordId::new(3));
    let first_page = json!({
        "items": [task_json(4, "d"), task_json(3, "c")],
        "nextPageToken": token.clone(),
    });
    store.api().push_list(Ok(first_page.clone()));
    store.dispatch(Action::RequestReload);
    store.settle().await;

    let release_next = store.api().push_list_gated(Ok(json!({
        "items": [task_json(2, "b"), task_json(1, "a")],
        "nextPageToken": null,
    })));
    store.dispatch(Action::RequestNextPage);
    while store.api().list_calls() < 2 {
        tokio::task::yield_now().await;
    }
    assert_eq!(store.state().task_list.status, LoadStatus::LoadingMore);

    let release_reload = store.api().push_list_gated(Ok(first_page));
    let mut actions = store.actions();
    store.dispatch(Action::RequestReload);
    assert_eq!(store.state().task_list.status, LoadStatus::Loading);
    while store.api().list_calls() < 3 {
        tokio::task::yield_now().await;
    }

    // The next-page answer lands first and is ignored.
    release_next.send(()).unwrap();
    wait_for(&mut actions, |a| matches!(a, Action::PageReceived { .. })).await;
    let state = store.state();
    assert_eq!(state.task_list.status, LoadStatus::Loading);
    assert!(state.task_list.items.is_empty());

    release_reload.send(()).unwrap();
    store.settle().await;

    let state = store.state();
    assert_eq!(store.api().list_calls(), 3);
    assert_eq!(
        store.api().calls()[2],
        ApiCall::ListTasks {
            page_size: 2,
            page_token: None,
        }
    );
    assert_eq!(state.task_list.status, LoadStatus::Loaded);
    assert_eq!(state.task_list.next_page_cursor, Some(token));
    let mut ids: Vec<TaskId> = state.task_list.items.keys().cloned().collect();
    ids.sort();
    assert_eq!(
        ids,
        vec![
            TaskId::Permanent(RecordId::new(3)),
            TaskId::Permanent(RecordId::new(4)),
        ]
    );
}

#[tokio::test]
async fn next_page_during_next_page_is_suppressed() {
    let store = store();
    store.api().push_list(Ok(json!({
        "items": [task_json(2, "b")],
        "nextPageToken": cursor::encode(RecordId::new(2)),
    })));
    store
        .api()
        .push_list(Ok(json!({"items": [task_json(1, "a")], "nextPageToken": null})));
    store.dispatch(Action::RequestReload);
    store.settle().await;

    store.dispatch(Action::RequestNextPage);
    store.dispatch(Action::RequestNextPage);
    store.settle().await;

    assert_eq!(store.api().list_calls(), 2);
    assert_eq!(store.state().task_list.items.len(), 2);
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_then_confirm() {
    let store = store();
    store.api().push_create(created(42, "buy milk"));

    store.dispatch(Action::EditDraft {
        text: "buy milk".to_string(),
    });
    let temp_id = store.submit_draft();

    // Optimistic insert and draft reset happen before any I/O completes.
    let state = store.state();
    assert_eq!(state.draft.text, "");
    let pending = &state.task_list.items[&TaskId::Temporary(temp_id.clone())];
    assert!(pending.is_pending);
    assert_eq!(pending.text, "buy milk");

    store.settle().await;

    let state = store.state();
    assert!(
        !state
            .task_list
            .items
            .contains_key(&TaskId::Temporary(temp_id))
    );
    let task = &state.task_list.items[&TaskId::Permanent(RecordId::new(42))];
    assert!(!task.is_pending);
    assert_eq!(task.text, "buy milk");
    assert_eq!(
        store.api().calls(),
        vec![ApiCall::CreateTask {
            text: "buy milk".to_string()
        }]
    );
}

#[tokio::test]
async fn failed_create_rolls_back_without_restoring_draft() {
    let store = store();
    store.api().push_create(Err(ApiError::Status {
        status: 400,
        status_text: "Bad Request".to_string(),
    }));
    let mut actions = store.actions();

    store.dispatch(Action::EditDraft {
        text: "   ".to_string(),
    });
    store.submit_draft();
    store.settle().await;

    let state = store.state();
    assert!(state.task_list.items.is_empty());
    assert_eq!(state.draft.text, "");
    assert_eq!(
        drain_tags(&mut actions),
        vec![
            ActionTag::EditDraft,
            ActionTag::BeginCreate,
            ActionTag::ClearDraft,
            ActionTag::CreateFailed,
        ]
    );
}

#[tokio::test]
async fn malformed_create_response_triggers_reload() {
    let store = store();
    store.api().push_create(Ok(json!({"item": {}})));
    store
        .api()
        .push_list(Ok(json!({"items": [task_json(1, "buy milk")], "nextPageToken": null})));
    let mut actions = store.actions();

    store.dispatch(Action::EditDraft {
        text: "buy milk".to_string(),
    });
    store.submit_draft();
    store.settle().await;

    let tags = drain_tags(&mut actions);
    assert!(tags.contains(&ActionTag::RequestReload));
    assert!(!tags.contains(&ActionTag::CreateConfirmed));
    assert!(!tags.contains(&ActionTag::CreateFailed));

    let state = store.state();
    assert_eq!(state.task_list.status, LoadStatus::Loaded);
    assert_eq!(state.task_list.items.len(), 1);
    assert!(
        state
            .task_list
            .items
            .contains_key(&TaskId::Permanent(RecordId::new(1)))
    );
}

#[tokio::test]
async fn concurrent_creates_confirm_out_of_order() {
    let store = store();
    let mut actions = store.actions();
    let release_first = store.api().push_create_gated(created(1, "first"));
    let release_second = store.api().push_create_gated(created(2, "second"));

    let first = submit(&store, "first").await;
    let second = submit(&store, "second").await;
    assert_eq!(tasksync::selectors::pending_count(&store.state()), 2);

    release_second.send(()).unwrap();
    wait_for(&mut actions, |a| {
        matches!(a, Action::CreateConfirmed { temp_id, .. } if *temp_id == second)
    })
    .await;

    let state = store.state();
    assert!(state.task_list.items[&TaskId::Temporary(first.clone())].is_pending);
    assert_eq!(
        state.task_list.items[&TaskId::Permanent(RecordId::new(2))].text,
        "second"
    );

    release_first.send(()).unwrap();
    store.settle().await;

    let state = store.state();
    assert_eq!(tasksync::selectors::pending_count(&state), 0);
    assert_eq!(
        state.task_list.items[&TaskId::Permanent(RecordId::new(1))].text,
        "first"
    );
    assert!(
        !state
            .task_list
            .items
            .contains_key(&TaskId::Temporary(first))
    );
}

#[tokio::test]
async fn late_confirmation_after_local_delete_is_dropped() {
    let store = store();
    let release = store.api().push_create_gated(created(9, "gone"));

    let temp_id = submit(&store, "gone").await;
    store.dispatch(Action::DeleteTask {
        id: TaskId::Temporary(temp_id),
    });
    release.send(()).unwrap();
    store.settle().await;

    assert!(store.state().task_list.items.is_empty());
}
