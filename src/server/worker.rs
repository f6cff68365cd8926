// src/server/worker.rs
use std::sync::Arc;

use tempfile::NamedTempFile;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::answering::QuestionAnswerer;
use crate::completion::CompletionService;
use crate::document::converter_for;
use crate::storage::TaskStore;

/// A queued document waiting to be answered.
pub struct Job {
    pub task_id: Uuid,
    /// Removed from disk once the job is dropped.
    pub upload: NamedTempFile,
}

/// Processes jobs one at a time until every sender is gone.
pub async fn run_worker<C>(mut jobs: mpsc::Receiver<Job>, store: TaskStore, answerer: Arc<QuestionAnswerer<C>>)
where
    C: CompletionService + 'static,
{
    tracing::info!("Worker started ({} questions per document)", answerer.catalog().len());
    while let Some(job) = jobs.recv().await {
        process_job(&store, &answerer, job).await;
    }
    tracing::info!("Job queue closed, worker stopping");
}

/// Runs one job to exactly one terminal state.
async fn process_job<C: CompletionService>(store: &TaskStore, answerer: &QuestionAnswerer<C>, job: Job) {
    let Job { task_id, upload } = job;

    if let Err(e) = store.start(task_id) {
        tracing::warn!("Skipping job {}: {}", task_id, e);
        return;
    }

    // Text extraction is CPU-bound
    let path = upload.path().to_path_buf();
    let converted = tokio::task::spawn_blocking(move || converter_for(&path).convert(&path)).await;

    let text = match converted {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => return finish_failed(store, task_id, e.to_string()),
        Err(e) => return finish_failed(store, task_id, format!("Conversion task failed: {}", e)),
    };

    let progress_store = store.clone();
    let outcome = answerer
        .run(&text, move |current, total| {
            if let Err(e) = progress_store.set_progress(task_id, current, total) {
                tracing::warn!("Progress update rejected: {}", e);
            }
        })
        .await;

    match outcome {
        Ok(answers) => {
            if let Err(e) = store.complete(task_id, answers) {
                tracing::error!("Could not complete task {}: {}", task_id, e);
            }
        }
        Err(e) => finish_failed(store, task_id, e.to_string()),
    }

    drop(upload);
}

fn finish_failed(store: &TaskStore, task_id: Uuid, message: String) {
    if let Err(e) = store.fail(task_id, message) {
        tracing::error!("Could not mark task {} as failed: {}", task_id, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::convert::tag_pages;
    use crate::extractors::SectionExtractor;
    use crate::questions::{Question, QuestionCatalog};
    use crate::storage::TaskStatus;
    use crate::utils::error::CompletionError;
    use std::io::Write;

    struct EchoCompletion {
        missing_key: bool,
    }

    impl CompletionService for EchoCompletion {
        async fn complete(&self, question_number: u32, context: &str, _prompt: &str) -> Result<String, CompletionError> {
            if self.missing_key {
                return Err(CompletionError::MissingCredential { bucket: 1, question: question_number });
            }
            Ok(format!("seen: {}", context))
        }
    }

    fn answerer(missing_key: bool) -> Arc<QuestionAnswerer<EchoCompletion>> {
        let catalog = QuestionCatalog::new(vec![Question {
            number: 1,
            sections: vec!["7.1".parse().unwrap()],
            text: "What is the capital?".to_string(),
            how_to_fill: String::new(),
            observations: String::new(),
        }]);
        Arc::new(QuestionAnswerer::new(SectionExtractor::new(), EchoCompletion { missing_key }, Arc::new(catalog)))
    }

    fn tagged_upload() -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        let text = tag_pages([
            "Índice\n7.1 Capital Structure 2\n",
            "7.1 Capital Structure of the company\nFully paid in.\n",
        ]);
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    async fn run_single(upload: NamedTempFile, missing_key: bool) -> (TaskStore, Uuid) {
        let store = TaskStore::new();
        let task_id = store.create();
        let (tx, rx) = mpsc::channel(4);
        tx.send(Job { task_id, upload }).await.unwrap();
        drop(tx);

        run_worker(rx, store.clone(), answerer(missing_key)).await;
        (store, task_id)
    }

    #[tokio::test]
    async fn job_completes_with_answers_and_removes_upload() {
        let upload = tagged_upload();
        let path = upload.path().to_path_buf();

        let (store, task_id) = run_single(upload, false).await;
        let task = store.get(task_id).unwrap();

        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.progress, 100);
        assert_eq!(task.total_questions, 1);
        assert_eq!(task.result.unwrap()["What is the capital?"], "seen: Fully paid in.");
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn missing_credential_fails_the_task() {
        let (store, task_id) = run_single(tagged_upload(), true).await;
        let task = store.get(task_id).unwrap();

        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.error.unwrap().contains("GEMINI_KEY_1"));
    }

    #[tokio::test]
    async fn unreadable_document_fails_the_task() {
        let empty = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        let (store, task_id) = run_single(empty, false).await;
        let task = store.get(task_id).unwrap();

        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.error.as_deref(), Some("Document produced no text"));
    }
}
