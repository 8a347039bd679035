//! JSON encoding for the `Taskboard` REST payloads.
//!
//! Request and response bodies are plain JSON arrays: `List<TaskReorderItem>`
//! for a reorder request, `List<Task>` for task listings and reorder
//! responses. Error responses carry an [`ErrorBody`].

use serde::{Deserialize, Serialize};

use crate::reorder::TaskReorderItem;
use crate::task::Task;

/// Error type for codec encode/decode operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Body of every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable reason.
    pub detail: String,
}

impl ErrorBody {
    /// Creates an error body.
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// Encodes a task list.
///
/// # Errors
///
/// Returns [`CodecError::Serialization`] if a task cannot be serialized.
pub fn encode_tasks(tasks: &[Task]) -> Result<Vec<u8>, CodecError> {
    Ok(serde_json::to_vec(tasks)?)
}

/// Decodes a task list.
///
/// # Errors
///
/// Returns [`CodecError::Serialization`] if the bytes are not a JSON task list.
pub fn decode_tasks(bytes: &[u8]) -> Result<Vec<Task>, CodecError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Encodes a reorder batch.
///
/// # Errors
///
/// Returns [`CodecError::Serialization`] if an item cannot be serialized.
pub fn encode_batch(items: &[TaskReorderItem]) -> Result<Vec<u8>, CodecError> {
    Ok(serde_json::to_vec(items)?)
}

/// Decodes a reorder batch.
///
/// # Errors
///
/// Returns [`CodecError::Serialization`] if the bytes are not a JSON batch.
pub fn decode_batch(bytes: &[u8]) -> Result<Vec<TaskReorderItem>, CodecError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Extracts the `detail` message from an error body, falling back to the
/// raw text when the body is not an [`ErrorBody`].
#[must_use]
pub fn error_detail(bytes: &[u8]) -> String {
    serde_json::from_slice::<ErrorBody>(bytes).map_or_else(
        |_| String::from_utf8_lossy(bytes).trim().to_string(),
        |body| body.detail,
    )
}
