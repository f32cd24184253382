//! tasksync record-storage server library.
//!
//! Exposes the task store, the cursor pagination contract and the axum
//! router for use in tests and embedding. The binary in `main.rs` only
//! loads configuration and serves.

pub mod config;
pub mod error;
pub mod pagination;
pub mod server;
pub mod store;
