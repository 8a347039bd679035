//! Remote task service abstraction.
//!
//! Defines the [`RemoteTaskService`] trait the sync engine talks to.
//! Implementations:
//! - [`http::HttpTaskService`]: JSON over HTTP against `taskboard-server`
//! - [`loopback::LoopbackTaskService`]: in-process service for tests

pub mod http;
pub mod loopback;

use taskboard_proto::codec::CodecError;
use taskboard_proto::reorder::TaskReorderItem;
use taskboard_proto::task::{Scope, Task};

/// Errors returned by a [`RemoteTaskService`].
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The request could not be sent or the response could not be read.
    #[error("transport error: {0}")]
    Transport(String),

    /// No response arrived within the request timeout.
    #[error("request timed out")]
    Timeout,

    /// The service answered with a non-success status.
    #[error("request rejected ({status}): {detail}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// `detail` from the error body.
        detail: String,
    },

    /// The response body was not the expected JSON.
    #[error("invalid response body: {0}")]
    Decode(#[from] CodecError),

    /// The service could not be reached.
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

impl RemoteError {
    /// HTTP status of a rejection, if this is one.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Async access to the authoritative task list.
///
/// Both calls return the complete, authoritative task list for `scope`
/// as the server sees it after the call.
pub trait RemoteTaskService: Send + Sync {
    /// Submits one reorder batch. The batch is applied all or nothing.
    fn submit_reorder(
        &self,
        scope: Scope,
        changes: &[TaskReorderItem],
    ) -> impl std::future::Future<Output = Result<Vec<Task>, RemoteError>> + Send;

    /// Fetches the task list.
    fn fetch_tasks(
        &self,
        scope: Scope,
    ) -> impl std::future::Future<Output = Result<Vec<Task>, RemoteError>> + Send;
}
