// src/server/handlers.rs
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use uuid::Uuid;

use crate::server::models::{ErrorResponse, SubmitResponse, TaskListResponse, TaskStatusResponse};
use crate::server::upload;
use crate::server::worker::Job;
use crate::server::AppState;
use crate::storage::TaskStatus;

/// Error reply rendered as `{"detail": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self { status, detail: detail.into() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { detail: self.detail })).into_response()
    }
}

/// `POST /api/extract`
pub async fn submit(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let uploaded = upload::parse_multipart(multipart)
        .await
        .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, e))?;

    let task_id = state.store.create();
    let job = Job { task_id, upload: uploaded.file };

    if state.jobs.send(job).await.is_err() {
        tracing::error!("Job queue is closed; rejecting task {}", task_id);
        let _ = state.store.fail(task_id, "Processing queue unavailable");
        return Err(ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "Processing queue unavailable"));
    }

    tracing::info!("Queued '{}' as task {}", uploaded.filename, task_id);
    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            task_id: task_id.to_string(),
            status: TaskStatus::Pending,
            message: "File received. Processing started.".to_string(),
        }),
    ))
}

/// `GET /api/extract/{task_id}`
pub async fn status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<TaskStatusResponse>, ApiError> {
    let not_found = || ApiError::new(StatusCode::NOT_FOUND, "Task ID not found");

    let id = Uuid::parse_str(&task_id).map_err(|_| not_found())?;
    let task = state.store.get(id).ok_or_else(not_found)?;

    Ok(Json(TaskStatusResponse { task_id: id.to_string(), task }))
}

/// `GET /api/extract`
pub async fn list(State(state): State<AppState>) -> Json<TaskListResponse> {
    let tasks: indexmap::IndexMap<String, _> =
        state.store.list().into_iter().map(|(id, task)| (id.to_string(), task)).collect();
    let total = tasks.len();
    Json(TaskListResponse { tasks, total })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::TaskStore;
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::Request;
    use tokio::sync::mpsc;

    const BOUNDARY: &str = "XBOUNDARYX";

    fn state() -> (AppState, mpsc::Receiver<Job>) {
        let (jobs, rx) = mpsc::channel(4);
        (AppState { store: TaskStore::new(), jobs }, rx)
    }

    async fn multipart(field: &str, filename: &str, content: &str) -> Multipart {
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n{content}\r\n--{b}--\r\n",
            b = BOUNDARY
        );
        let request = Request::builder()
            .method("POST")
            .uri("/api/extract")
            .header("content-type", format!("multipart/form-data; boundary={}", BOUNDARY))
            .body(Body::from(body))
            .unwrap();
        Multipart::from_request(request, &()).await.unwrap()
    }

    #[tokio::test]
    async fn submit_queues_a_pending_task() {
        let (state, mut rx) = state();
        let form = multipart("file", "filing.txt", "---  PÁGINA 1 ---\nbody").await;

        let (code, Json(reply)) = submit(State(state.clone()), form).await.unwrap();
        assert_eq!(code, StatusCode::ACCEPTED);
        assert_eq!(reply.status, TaskStatus::Pending);

        let job = rx.recv().await.unwrap();
        assert_eq!(job.task_id.to_string(), reply.task_id);
        assert_eq!(job.upload.path().extension().and_then(|e| e.to_str()), Some("txt"));
        assert_eq!(state.store.get(job.task_id).unwrap().status, TaskStatus::Pending);
    }

    #[tokio::test]
    async fn submit_without_file_field_is_bad_request() {
        let (state, _rx) = state();
        let form = multipart("document", "filing.txt", "content").await;

        let err = submit(State(state.clone()), form).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(state.store.list().is_empty());
    }

    #[tokio::test]
    async fn status_reports_known_tasks_and_404s_otherwise() {
        let (state, _rx) = state();
        let id = state.store.create();

        let Json(reply) = status(State(state.clone()), Path(id.to_string())).await.unwrap();
        assert_eq!(reply.task.status, TaskStatus::Pending);

        let unknown = status(State(state.clone()), Path(Uuid::new_v4().to_string())).await.unwrap_err();
        assert_eq!(unknown.status, StatusCode::NOT_FOUND);

        let malformed = status(State(state), Path("not-a-uuid".to_string())).await.unwrap_err();
        assert_eq!(malformed.status, StatusCode::NOT_FOUND);
        assert_eq!(malformed.detail, "Task ID not found");
    }

    #[tokio::test]
    async fn list_returns_every_task() {
        let (state, _rx) = state();
        let first = state.store.create();
        let second = state.store.create();

        let Json(reply) = list(State(state)).await;
        assert_eq!(reply.total, 2);
        assert!(reply.tasks.contains_key(&first.to_string()));
        assert!(reply.tasks.contains_key(&second.to_string()));

        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["tasks"][first.to_string()]["status"], "pending");
    }
}
