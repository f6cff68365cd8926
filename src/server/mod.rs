// src/server/mod.rs
pub mod handlers;
pub mod models;
pub mod upload;
pub mod worker;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use tokio::sync::mpsc;
use tower_http::cors::CorsLayer;

use crate::answering::QuestionAnswerer;
use crate::completion::CompletionService;
use crate::config::AppConfig;
use crate::storage::TaskStore;
use crate::utils::AppError;
use worker::Job;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: TaskStore,
    pub jobs: mpsc::Sender<Job>,
}

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/api/extract", get(handlers::list).post(handlers::submit))
        .route("/api/extract/{task_id}", get(handlers::status))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Starts the worker and serves the API until the process is stopped.
pub async fn serve<C>(config: &AppConfig, answerer: QuestionAnswerer<C>) -> Result<(), AppError>
where
    C: CompletionService + 'static,
{
    let store = TaskStore::new();
    let (jobs, queue) = mpsc::channel(config.queue_capacity);

    tokio::spawn(worker::run_worker(queue, store.clone(), Arc::new(answerer)));

    let app = router(AppState { store, jobs }, config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .map_err(|e| AppError::Server(format!("Cannot bind {}: {}", config.bind_addr, e)))?;
    tracing::info!("Listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Server(e.to_string()))
}
