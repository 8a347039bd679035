//! Shared protocol definitions for the `Taskboard` REST API.

pub mod codec;
pub mod column;
pub mod reorder;
pub mod task;
