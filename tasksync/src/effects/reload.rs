//! Page loading workflows.
//!
//! `RequestReload` fetches the first page; `RequestNextPage` fetches the page
//! after the trigger-time cursor. A reload is suppressed while another reload
//! is in flight. A next-page fetch is suppressed while any fetch is in flight,
//! but never holds back a reload. Both judge by the state the action was
//! dispatched against.
//!
//! Every fetch carries the load generation it was issued under, and the
//! reducer ignores results whose generation a later reload has replaced.
//! Both validate the response body with [`page_from_body`] and report the
//! outcome as `PageReceived` or `PageLoadFailed`.

use serde_json::Value;
use tasksync_proto::cursor::PageToken;
use tasksync_proto::task::TaskRecord;

use super::{EffectContext, EffectFuture};
use crate::actions::Action;
use crate::api::ApiClient;
use crate::state::LoadStatus;

/// Handler for [`Action::RequestReload`].
pub fn on_request_reload<A: ApiClient>(
    _action: &Action,
    ctx: &EffectContext<A>,
) -> Option<EffectFuture> {
    if ctx.prior().task_list.status == LoadStatus::Loading {
        tracing::debug!("reload already in flight, suppressed");
        return None;
    }
    // Handlers run before the next queued action is reduced, so the live
    // state still carries the generation this reload started.
    let generation = ctx.state().task_list.generation;
    Some(fetch_page(ctx.clone(), None, generation))
}

/// Handler for [`Action::RequestNextPage`].
pub fn on_request_next_page<A: ApiClient>(
    _action: &Action,
    ctx: &EffectContext<A>,
) -> Option<EffectFuture> {
    let list = &ctx.prior().task_list;
    if matches!(list.status, LoadStatus::Loading | LoadStatus::LoadingMore) {
        tracing::debug!(status = %list.status, "page fetch already in flight, next page suppressed");
        return None;
    }
    let Some(cursor) = list.next_page_cursor.clone() else {
        tracing::debug!("no next page cursor, next page suppressed");
        return None;
    };
    Some(fetch_page(ctx.clone(), Some(cursor), list.generation))
}

fn fetch_page<A: ApiClient>(
    ctx: EffectContext<A>,
    cursor: Option<PageToken>,
    generation: u64,
) -> EffectFuture {
    Box::pin(async move {
        let page_size = ctx.page_size();
        let outcome = ctx.api().list_tasks(page_size, cursor.as_ref()).await;
        let action = match outcome {
            Ok(body) => page_from_body(&body, generation),
            Err(e) => {
                tracing::warn!(error = %e, has_cursor = cursor.is_some(), generation, "page load failed");
                Action::PageLoadFailed {
                    message: e.to_string(),
                    generation,
                }
            }
        };
        ctx.dispatch(action);
    })
}

/// Turns a list response body into a `PageReceived` action.
///
/// A body without an `items` array yields an empty last page. Elements that
/// are not task records are dropped. A missing or `null` `nextPageToken`
/// means there are no further pages. The action is tagged with `generation`.
#[must_use]
pub fn page_from_body(body: &Value, generation: u64) -> Action {
    let Some(raw_items) = body.get("items").and_then(Value::as_array) else {
        tracing::warn!(
            has_items = body.get("items").is_some(),
            "page response has no items array, treating as empty"
        );
        return Action::PageReceived {
            items: Vec::new(),
            cursor: None,
            generation,
        };
    };

    let items: Vec<TaskRecord> = raw_items
        .iter()
        .enumerate()
        .filter_map(
            |(index, raw)| match serde_json::from_value::<TaskRecord>(raw.clone()) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(index, error = %e, "skipping malformed task in page");
                    None
                }
            },
        )
        .collect();

    let cursor = match body.get("nextPageToken") {
        None | Some(Value::Null) => None,
        Some(Value::String(token)) => Some(PageToken::new(token.clone())),
        Some(other) => {
            tracing::warn!(token = %other, "next page token is not a string, ignoring");
            None
        }
    };

    Action::PageReceived {
        items,
        cursor,
        generation,
    }
}
