//! tasksync -- optimistic client state-synchronization engine.
//!
//! A single [`Store`] owns the client [`State`]. Every change goes through
//! [`Store::dispatch`]: the pure [`reducer`] computes the next state, then
//! the [`effects`] orchestrator reacts to the same action, talks to the
//! server through an [`api::ApiClient`], and dispatches the outcome as new
//! actions.

pub mod actions;
pub mod api;
pub mod config;
pub mod effects;
pub mod reducer;
pub mod selectors;
pub mod state;
pub mod store;

pub use actions::{Action, ActionTag};
pub use state::{LoadStatus, State, Task, TaskId, TaskPatch, TempId};
pub use store::{EngineConfig, Store};
