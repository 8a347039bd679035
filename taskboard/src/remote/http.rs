//! HTTP implementation of [`RemoteTaskService`].
//!
//! Talks JSON to the REST API served by `taskboard-server`:
//! `GET {base}/tasks` and `PUT {base}/tasks/reorder`, both with an optional
//! `?project_id=N`. Every request carries a fresh `x-request-id`.

use std::time::Duration;

use taskboard_proto::codec;
use taskboard_proto::reorder::TaskReorderItem;
use taskboard_proto::task::{Scope, ScopeQuery, Task};
use url::Url;
use uuid::Uuid;

use super::{RemoteError, RemoteTaskService};

/// Header used to correlate client and server logs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Remote task service reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTaskService {
    client: reqwest::Client,
    base: Url,
}

impl HttpTaskService {
    /// Creates a client for the API rooted at `base` (for example
    /// `http://localhost:8000/api`).
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Transport`] if the HTTP client cannot be built.
    pub fn new(mut base: Url, timeout: Duration) -> Result<Self, RemoteError> {
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        Ok(Self { client, base })
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub const fn base(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url, RemoteError> {
        self.base
            .join(path)
            .map_err(|e| RemoteError::Transport(format!("invalid endpoint {path}: {e}")))
    }

    async fn read_tasks(response: reqwest::Response) -> Result<Vec<Task>, RemoteError> {
        let status = response.status();
        let body = response.bytes().await.map_err(map_reqwest)?;
        if !status.is_success() {
            return Err(RemoteError::Rejected {
                status: status.as_u16(),
                detail: codec::error_detail(&body),
            });
        }
        Ok(codec::decode_tasks(&body)?)
    }
}

impl RemoteTaskService for HttpTaskService {
    async fn submit_reorder(
        &self,
        scope: Scope,
        changes: &[TaskReorderItem],
    ) -> Result<Vec<Task>, RemoteError> {
        let url = self.endpoint("tasks/reorder")?;
        let request_id = Uuid::now_v7();
        tracing::debug!(%url, %request_id, %scope, items = changes.len(), "submitting reorder");

        let response = self
            .client
            .put(url)
            .query(&ScopeQuery::from(scope))
            .header(REQUEST_ID_HEADER, request_id.to_string())
            .json(changes)
            .send()
            .await
            .map_err(map_reqwest)?;
        Self::read_tasks(response).await
    }

    async fn fetch_tasks(&self, scope: Scope) -> Result<Vec<Task>, RemoteError> {
        let url = self.endpoint("tasks")?;
        let request_id = Uuid::now_v7();
        tracing::debug!(%url, %request_id, %scope, "fetching tasks");

        let response = self
            .client
            .get(url)
            .query(&ScopeQuery::from(scope))
            .header(REQUEST_ID_HEADER, request_id.to_string())
            .send()
            .await
            .map_err(map_reqwest)?;
        Self::read_tasks(response).await
    }
}

fn map_reqwest(error: reqwest::Error) -> RemoteError {
    if error.is_timeout() {
        RemoteError::Timeout
    } else if error.is_connect() {
        RemoteError::Unavailable(error.to_string())
    } else {
        RemoteError::Transport(error.to_string())
    }
}
