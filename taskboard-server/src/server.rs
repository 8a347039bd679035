//! REST API: routes, handlers, and error mapping.
//!
//! ```text
//! GET  /health
//! GET  /api/tasks[?project_id=N]
//! PUT  /api/tasks/reorder[?project_id=N]   body: [TaskReorderItem]
//! ```
//!
//! Both task endpoints answer with the scoped task list sorted by
//! `(order_in_list, id)`. Errors answer `{"detail": "..."}`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use taskboard_proto::codec::{self, CodecError, ErrorBody};
use taskboard_proto::reorder::{ReorderError, validate_batch};
use taskboard_proto::task::{Scope, ScopeQuery, Task};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::repository::TaskRepository;

/// Header carrying the client's request id.
const REQUEST_ID_HEADER: &str = "x-request-id";

/// Error response with a JSON `detail` body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody::new(self.detail))).into_response()
    }
}

impl From<ReorderError> for ApiError {
    fn from(error: ReorderError) -> Self {
        let status = match error {
            ReorderError::UnknownTask(_) => StatusCode::NOT_FOUND,
            ReorderError::EmptyPatch(_)
            | ReorderError::DuplicateTask(_)
            | ReorderError::NonFiniteOrder { .. }
            | ReorderError::UnknownStatus { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        };
        Self {
            status,
            detail: error.to_string(),
        }
    }
}

impl From<CodecError> for ApiError {
    fn from(error: CodecError) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            detail: error.to_string(),
        }
    }
}

/// Builds the application router.
pub fn router(state: Arc<TaskRepository>) -> Router {
    let api = Router::new()
        .route("/tasks", get(list_tasks))
        .route("/tasks/reorder", put(reorder_tasks));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .with_state(state)
}

/// Errors starting the server.
#[derive(Debug, thiserror::Error)]
pub enum StartError {
    /// The listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Requested address.
        addr: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// A server running on a background task.
#[derive(Debug)]
pub struct RunningServer {
    /// Bound address, with an OS-assigned port resolved.
    pub addr: SocketAddr,
    /// Task driving the server.
    pub task: JoinHandle<()>,
}

/// Binds `addr` and serves `repository` on a spawned task.
///
/// # Errors
///
/// Returns [`StartError::Bind`] if the listener cannot be bound.
pub async fn serve(addr: &str, repository: Arc<TaskRepository>) -> Result<RunningServer, StartError> {
    let bind_error = |source: std::io::Error| StartError::Bind {
        addr: addr.to_string(),
        source,
    };
    let listener = TcpListener::bind(addr).await.map_err(bind_error)?;
    let bound = listener.local_addr().map_err(bind_error)?;

    let app = router(repository);
    let task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "taskboard server stopped");
        }
    });
    tracing::debug!(addr = %bound, "listener bound");
    Ok(RunningServer { addr: bound, task })
}

async fn health() -> &'static str {
    "ok"
}

async fn list_tasks(
    State(repository): State<Arc<TaskRepository>>,
    Query(query): Query<ScopeQuery>,
    headers: HeaderMap,
) -> Json<Vec<Task>> {
    let scope = Scope::from(query);
    let tasks = repository.list(scope).await;
    tracing::debug!(
        request_id = request_id(&headers),
        %scope,
        count = tasks.len(),
        "listed tasks"
    );
    Json(tasks)
}

async fn reorder_tasks(
    State(repository): State<Arc<TaskRepository>>,
    Query(query): Query<ScopeQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Vec<Task>>, ApiError> {
    let scope = Scope::from(query);
    let request_id = request_id(&headers);

    let result = async {
        let items = codec::decode_batch(&body)?;
        validate_batch(&items)?;
        let tasks = repository.reorder(scope, &items).await?;
        Ok::<_, ApiError>((items.len(), tasks))
    }
    .await;

    match result {
        Ok((applied, tasks)) => {
            tracing::info!(request_id, %scope, applied, "reorder applied");
            Ok(Json(tasks))
        }
        Err(error) => {
            tracing::warn!(
                request_id,
                %scope,
                status = error.status.as_u16(),
                detail = %error.detail,
                "reorder rejected"
            );
            Err(error)
        }
    }
}

fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
}
