//! The single state container.
//!
//! [`Store`] owns the current [`State`] and is the only path that changes
//! it. `dispatch` runs the reducer, publishes the new snapshot and the
//! action, then lets the effect orchestrator react. Dispatch is re-entrant:
//! actions dispatched while another dispatch is draining (from a handler,
//! or from another thread) are queued and applied in order by the drainer.
//!
//! Cloning a `Store` yields another handle to the same container.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tasksync_proto::task::DEFAULT_PAGE_SIZE;
use tokio::runtime::Handle;
use tokio::sync::{Notify, broadcast, watch};

use crate::actions::Action;
use crate::api::ApiClient;
use crate::effects::{EffectContext, EffectFuture, Orchestrator};
use crate::reducer;
use crate::state::{State, TempId};

/// Engine tuning knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Page size sent with every list request.
    pub page_size: u32,
    /// Capacity of the [`Store::actions`] broadcast channel.
    pub action_buffer: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            action_buffer: 256,
        }
    }
}

#[derive(Default)]
struct DispatchQueue {
    pending: VecDeque<Action>,
    draining: bool,
}

struct Inner<A: ApiClient> {
    api: A,
    config: EngineConfig,
    effects: Orchestrator<A>,
    state_tx: watch::Sender<Arc<State>>,
    action_tx: broadcast::Sender<Action>,
    queue: Mutex<DispatchQueue>,
    /// Queued actions plus running effect futures.
    outstanding: AtomicUsize,
    idle: Notify,
    runtime: Handle,
}

/// Handle to the client state container.
pub struct Store<A: ApiClient> {
    inner: Arc<Inner<A>>,
}

impl<A: ApiClient> Clone for Store<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Decrements the outstanding count when dropped, even if the effect panics.
struct OutstandingGuard<A: ApiClient>(Store<A>);

impl<A: ApiClient> Drop for OutstandingGuard<A> {
    fn drop(&mut self) {
        self.0.finish_one();
    }
}

impl<A: ApiClient> Store<A> {
    /// Creates a store with the default workflows.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime; effect futures are spawned
    /// onto the runtime that created the store.
    #[must_use]
    pub fn new(api: A, config: EngineConfig) -> Self {
        Self::with_orchestrator(api, config, Orchestrator::with_default_workflows())
    }

    /// Creates a store with a caller-supplied handler registry.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn with_orchestrator(api: A, config: EngineConfig, effects: Orchestrator<A>) -> Self {
        let (state_tx, _) = watch::channel(Arc::new(State::default()));
        let (action_tx, _) = broadcast::channel(config.action_buffer.max(1));
        Self {
            inner: Arc::new(Inner {
                api,
                config,
                effects,
                state_tx,
                action_tx,
                queue: Mutex::new(DispatchQueue::default()),
                outstanding: AtomicUsize::new(0),
                idle: Notify::new(),
                runtime: Handle::current(),
            }),
        }
    }

    /// The server client.
    pub fn api(&self) -> &A {
        &self.inner.api
    }

    /// Engine configuration.
    pub fn config(&self) -> EngineConfig {
        self.inner.config
    }

    /// Current state snapshot.
    pub fn state(&self) -> Arc<State> {
        self.inner.state_tx.borrow().clone()
    }

    /// Receiver that observes every new state snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Arc<State>> {
        self.inner.state_tx.subscribe()
    }

    /// Receiver of every action, in the order it was reduced.
    pub fn actions(&self) -> broadcast::Receiver<Action> {
        self.inner.action_tx.subscribe()
    }

    /// Generates a fresh temporary id for an optimistic create.
    #[must_use]
    pub fn next_temp_id() -> TempId {
        TempId::generate()
    }

    /// Starts creating a task from the current draft. Returns its temporary id.
    pub fn submit_draft(&self) -> TempId {
        let temp_id = Self::next_temp_id();
        self.dispatch(Action::BeginCreate {
            temp_id: temp_id.clone(),
        });
        temp_id
    }

    /// Applies `action` and runs its effects.
    ///
    /// If another dispatch is already draining the queue, `action` is queued
    /// behind it and this call returns immediately.
    pub fn dispatch(&self, action: Action) {
        self.inner.outstanding.fetch_add(1, Ordering::AcqRel);
        {
            let mut queue = self.inner.queue.lock();
            queue.pending.push_back(action);
            if queue.draining {
                return;
            }
            queue.draining = true;
        }
        self.drain();
    }

    /// Waits until no action is queued and no effect future is running.
    pub async fn settle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            if self.inner.outstanding.load(Ordering::Acquire) == 0 {
                return;
            }
            notified.await;
        }
    }

    fn drain(&self) {
        loop {
            let action = {
                let mut queue = self.inner.queue.lock();
                let Some(action) = queue.pending.pop_front() else {
                    queue.draining = false;
                    return;
                };
                action
            };
            self.apply(&action);
            self.finish_one();
        }
    }

    fn apply(&self, action: &Action) {
        let prior = self.state();
        let next = Arc::new(reducer::reduce(&prior, action));
        self.inner.state_tx.send_replace(next);
        tracing::trace!(action = ?action.tag(), "action reduced");

        // No receivers is fine.
        let _ = self.inner.action_tx.send(action.clone());

        let ctx = EffectContext::new(self.clone(), prior);
        for effect in self.inner.effects.run(action, &ctx) {
            self.spawn_effect(effect);
        }
    }

    fn spawn_effect(&self, effect: EffectFuture) {
        self.inner.outstanding.fetch_add(1, Ordering::AcqRel);
        let guard = OutstandingGuard(self.clone());
        self.inner.runtime.spawn(async move {
            let _guard = guard;
            effect.await;
        });
    }

    fn finish_one(&self) {
        if self.inner.outstanding.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.inner.idle.notify_waiters();
        }
    }
}
