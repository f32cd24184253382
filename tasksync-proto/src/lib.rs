//! Shared wire definitions for the tasksync REST protocol.

pub mod cursor;
pub mod task;
