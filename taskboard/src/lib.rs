//! `Taskboard` client core.
//!
//! Renders a kanban board from confirmed tasks, lets a drag reorder a
//! private working copy, and persists each drop as one minimal reorder
//! batch that the server confirms or rejects as a whole.

pub mod board;
pub mod config;
pub mod drag;
pub mod ordering;
pub mod remote;
pub mod store;
pub mod sync;
