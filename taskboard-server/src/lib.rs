//! `Taskboard` server library.
//!
//! Exposes the REST server for use in tests and embedding. The server
//! keeps the authoritative task list and applies reorder batches to it
//! atomically.

pub mod config;
pub mod repository;
pub mod server;
