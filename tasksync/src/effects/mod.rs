//! Effect orchestration.
//!
//! The [`Orchestrator`] maps action tags to handlers. After the store
//! reduces an action it calls every handler registered for that action's
//! tag with an [`EffectContext`]. A handler may dispatch follow-up actions
//! right away (they are queued behind the triggering action) and may return
//! an [`EffectFuture`] for the store to spawn. Handlers never touch state
//! directly; results come back as actions.
//!
//! Default workflows:
//! - [`reload`] -- `RequestReload` and `RequestNextPage` fetch a page
//! - [`create`] -- `BeginCreate` clears the draft and persists the task

pub mod create;
pub mod reload;

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::actions::{Action, ActionTag};
use crate::api::ApiClient;
use crate::state::State;
use crate::store::Store;

/// Spawned part of a workflow.
pub type EffectFuture = BoxFuture<'static, ()>;

/// A workflow entry point.
///
/// Runs synchronously inside dispatch; returns the asynchronous part, if any.
pub type Handler<A> = fn(&Action, &EffectContext<A>) -> Option<EffectFuture>;

/// What a handler can see and do.
pub struct EffectContext<A: ApiClient> {
    store: Store<A>,
    prior: Arc<State>,
}

impl<A: ApiClient> Clone for EffectContext<A> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            prior: Arc::clone(&self.prior),
        }
    }
}

impl<A: ApiClient> EffectContext<A> {
    pub(crate) const fn new(store: Store<A>, prior: Arc<State>) -> Self {
        Self { store, prior }
    }

    /// The server client.
    pub fn api(&self) -> &A {
        self.store.api()
    }

    /// State the triggering action was dispatched against, before reduction.
    pub fn prior(&self) -> &State {
        &self.prior
    }

    /// Current state.
    pub fn state(&self) -> Arc<State> {
        self.store.state()
    }

    /// Configured page size for list requests.
    pub fn page_size(&self) -> u32 {
        self.store.config().page_size
    }

    /// Dispatches an action through the store.
    pub fn dispatch(&self, action: Action) {
        self.store.dispatch(action);
    }
}

/// Registry of workflow handlers keyed by action tag.
pub struct Orchestrator<A: ApiClient> {
    handlers: HashMap<ActionTag, Vec<Handler<A>>>,
}

impl<A: ApiClient> Default for Orchestrator<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: ApiClient> Orchestrator<A> {
    /// Creates an orchestrator with no handlers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Creates an orchestrator with the reload, next-page and create
    /// workflows registered.
    #[must_use]
    pub fn with_default_workflows() -> Self {
        let mut orchestrator = Self::new();
        orchestrator.register(ActionTag::RequestReload, reload::on_request_reload::<A>);
        orchestrator.register(ActionTag::RequestNextPage, reload::on_request_next_page::<A>);
        orchestrator.register(ActionTag::BeginCreate, create::on_begin_create::<A>);
        orchestrator
    }

    /// Adds `handler` for actions tagged `tag`. Handlers for one tag run in
    /// registration order.
    pub fn register(&mut self, tag: ActionTag, handler: Handler<A>) {
        self.handlers.entry(tag).or_default().push(handler);
    }

    /// Number of handlers registered for `tag`.
    #[must_use]
    pub fn handler_count(&self, tag: ActionTag) -> usize {
        self.handlers.get(&tag).map_or(0, Vec::len)
    }

    /// Runs the handlers for `action` and collects their futures.
    pub(crate) fn run(&self, action: &Action, ctx: &EffectContext<A>) -> Vec<EffectFuture> {
        let Some(handlers) = self.handlers.get(&action.tag()) else {
            return Vec::new();
        };
        handlers
            .iter()
            .filter_map(|handler| handler(action, ctx))
            .collect()
    }
}
