// src/server/models.rs
use indexmap::IndexMap;
use serde::Serialize;

use crate::storage::{TaskSnapshot, TaskStatus};

// --- Response Bodies ---

#[derive(Debug, Clone, Serialize)]
pub struct SubmitResponse {
    pub task_id: String,
    pub status: TaskStatus,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskStatusResponse {
    pub task_id: String,
    #[serde(flatten)]
    pub task: TaskSnapshot,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskListResponse {
    pub tasks: IndexMap<String, TaskSnapshot>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}
