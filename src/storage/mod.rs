// src/storage/mod.rs
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::answering::Answers;
use crate::utils::error::TaskError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// State of one submitted document. Returned by value; the store keeps the
/// live copy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskSnapshot {
    pub status: TaskStatus,
    /// 0..=100
    pub progress: u8,
    pub current_question: usize,
    pub total_questions: usize,
    pub result: Option<Answers>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskSnapshot {
    fn new() -> Self {
        let now = Utc::now();
        Self {
            status: TaskStatus::Pending,
            progress: 0,
            current_question: 0,
            total_questions: 0,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Percentage of questions reached, rounded down.
pub fn progress_percent(current: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    (current.min(total) * 100 / total) as u8
}

/// Shared registry of tasks. Clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    tasks: Arc<Mutex<HashMap<Uuid, TaskSnapshot>>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock leaves the map itself intact
    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, TaskSnapshot>> {
        self.tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Registers a new pending task.
    pub fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.lock().insert(id, TaskSnapshot::new());
        tracing::info!("Created task {}", id);
        id
    }

    /// Applies `update` to task `id` if its current status is one of `from`.
    fn transition<F>(&self, id: Uuid, from: &[TaskStatus], to: TaskStatus, update: F) -> Result<(), TaskError>
    where
        F: FnOnce(&mut TaskSnapshot),
    {
        let mut tasks = self.lock();
        let task = tasks.get_mut(&id).ok_or_else(|| TaskError::NotFound(id.to_string()))?;

        if !from.contains(&task.status) {
            return Err(TaskError::InvalidTransition {
                id: id.to_string(),
                from: task.status.to_string(),
                to: to.to_string(),
            });
        }

        task.status = to;
        update(task);
        task.updated_at = Utc::now();
        Ok(())
    }

    pub fn start(&self, id: Uuid) -> Result<(), TaskError> {
        self.transition(id, &[TaskStatus::Pending], TaskStatus::Processing, |_| {})?;
        tracing::info!("Task {} processing", id);
        Ok(())
    }

    /// Records that question `current` of `total` is being answered.
    pub fn set_progress(&self, id: Uuid, current: usize, total: usize) -> Result<(), TaskError> {
        let mut tasks = self.lock();
        let task = tasks.get_mut(&id).ok_or_else(|| TaskError::NotFound(id.to_string()))?;

        if task.status.is_terminal() {
            return Err(TaskError::InvalidTransition {
                id: id.to_string(),
                from: task.status.to_string(),
                to: "progress".to_string(),
            });
        }

        task.current_question = current;
        task.total_questions = total;
        task.progress = progress_percent(current, total);
        task.updated_at = Utc::now();
        Ok(())
    }

    pub fn complete(&self, id: Uuid, result: Answers) -> Result<(), TaskError> {
        self.transition(id, &[TaskStatus::Pending, TaskStatus::Processing], TaskStatus::Completed, |task| {
            task.progress = 100;
            task.current_question = task.total_questions;
            task.result = Some(result);
        })?;
        tracing::info!("Task {} completed", id);
        Ok(())
    }

    pub fn fail(&self, id: Uuid, message: impl Into<String>) -> Result<(), TaskError> {
        let message = message.into();
        tracing::error!("Task {} failed: {}", id, message);
        self.transition(id, &[TaskStatus::Pending, TaskStatus::Processing], TaskStatus::Failed, |task| {
            task.error = Some(message);
        })
    }

    pub fn get(&self, id: Uuid) -> Option<TaskSnapshot> {
        self.lock().get(&id).cloned()
    }

    /// All tasks, oldest first.
    pub fn list(&self) -> Vec<(Uuid, TaskSnapshot)> {
        let mut tasks: Vec<(Uuid, TaskSnapshot)> =
            self.lock().iter().map(|(id, task)| (*id, task.clone())).collect();
        tasks.sort_by_key(|(_, task)| task.created_at);
        tasks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_rounds_down_and_handles_zero_total() {
        assert_eq!(progress_percent(0, 0), 0);
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 66);
        assert_eq!(progress_percent(3, 3), 100);
        assert_eq!(progress_percent(1, 7), 14);
    }

    #[test]
    fn lifecycle_pending_to_completed() {
        let store = TaskStore::new();
        let id = store.create();
        assert_eq!(store.get(id).unwrap().status, TaskStatus::Pending);

        store.start(id).unwrap();
        store.set_progress(id, 1, 4).unwrap();
        let snapshot = store.get(id).unwrap();
        assert_eq!(snapshot.status, TaskStatus::Processing);
        assert_eq!(snapshot.progress, 25);
        assert_eq!(snapshot.current_question, 1);

        let mut answers = Answers::new();
        answers.insert("Q?".to_string(), "A".to_string());
        store.complete(id, answers).unwrap();

        let done = store.get(id).unwrap();
        assert_eq!(done.status, TaskStatus::Completed);
        assert_eq!(done.progress, 100);
        assert_eq!(done.result.unwrap()["Q?"], "A");
        assert!(done.updated_at >= done.created_at);
    }

    #[test]
    fn terminal_states_reject_further_changes() {
        let store = TaskStore::new();
        let id = store.create();
        store.start(id).unwrap();
        store.fail(id, "boom").unwrap();

        assert!(matches!(store.complete(id, Answers::new()), Err(TaskError::InvalidTransition { .. })));
        assert!(matches!(store.set_progress(id, 1, 2), Err(TaskError::InvalidTransition { .. })));
        assert!(matches!(store.start(id), Err(TaskError::InvalidTransition { .. })));

        let failed = store.get(id).unwrap();
        assert_eq!(failed.status, TaskStatus::Failed);
        assert_eq!(failed.error.as_deref(), Some("boom"));
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let store = TaskStore::new();
        let stranger = Uuid::new_v4();
        assert!(store.get(stranger).is_none());
        assert_eq!(store.start(stranger), Err(TaskError::NotFound(stranger.to_string())));
    }

    #[test]
    fn clones_share_records_but_stores_are_isolated() {
        let store = TaskStore::new();
        let handle = store.clone();
        let id = store.create();
        assert!(handle.get(id).is_some());

        let other = TaskStore::new();
        assert!(other.get(id).is_none());
        assert!(other.list().is_empty());
        assert_eq!(handle.list().len(), 1);
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&TaskStatus::Processing).unwrap(), "\"processing\"");
    }
}
