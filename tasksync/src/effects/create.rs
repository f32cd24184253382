//! Optimistic create workflow.
//!
//! On `BeginCreate` the draft is cleared immediately and the draft text
//! captured at trigger time is sent to the server. The pending task is then
//! confirmed under its permanent id or rolled back. A response that does not
//! identify the stored record leaves the client unable to reconcile, so it
//! falls back to a full reload.

use serde_json::Value;
use tasksync_proto::task::RecordId;

use super::{EffectContext, EffectFuture};
use crate::actions::Action;
use crate::api::ApiClient;
use crate::state::TempId;

/// Handler for [`Action::BeginCreate`].
pub fn on_begin_create<A: ApiClient>(
    action: &Action,
    ctx: &EffectContext<A>,
) -> Option<EffectFuture> {
    let Action::BeginCreate { temp_id } = action else {
        return None;
    };

    ctx.dispatch(Action::ClearDraft);

    let text = ctx.prior().draft.text.clone();
    let temp_id = temp_id.clone();
    let ctx = ctx.clone();
    Some(Box::pin(async move {
        tracing::debug!(temp_id = %temp_id, "creating task");
        let action = match ctx.api().create_task(&text).await {
            Ok(body) => confirmation_from_body(temp_id, &body),
            Err(e) => {
                tracing::warn!(temp_id = %temp_id, error = %e, "create failed, rolling back");
                Action::CreateFailed {
                    temp_id,
                    message: e.to_string(),
                }
            }
        };
        ctx.dispatch(action);
    }))
}

/// Turns a create response body into `CreateConfirmed`, or `RequestReload`
/// when the body does not carry a usable `item.id`.
#[must_use]
pub fn confirmation_from_body(temp_id: TempId, body: &Value) -> Action {
    let item = body.get("item");
    let raw_id = item.and_then(|item| item.get("id"));
    match raw_id.and_then(Value::as_str).map(str::parse::<RecordId>) {
        Some(Ok(record_id)) => {
            tracing::debug!(temp_id = %temp_id, id = %record_id, "task confirmed");
            Action::CreateConfirmed { temp_id, record_id }
        }
        Some(Err(e)) => {
            tracing::warn!(
                temp_id = %temp_id,
                error = %e,
                "create response has an invalid id, reloading"
            );
            Action::RequestReload
        }
        None => {
            tracing::warn!(
                temp_id = %temp_id,
                has_item = item.is_some(),
                has_id = raw_id.is_some(),
                "create response has no item id, reloading"
            );
            Action::RequestReload
        }
    }
}
