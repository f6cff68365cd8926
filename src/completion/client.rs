// src/completion/client.rs
use std::future::Future;

use crate::completion::models::{GenerateContentRequest, GenerateContentResponse};
use crate::config::{CompletionConfig, KEY_BUCKETS};
use crate::utils::error::CompletionError;

/// Answers a natural-language instruction using extracted section text as
/// context.
pub trait CompletionService: Send + Sync {
    /// `question_number` is the catalog's 1-based number; implementations may
    /// use it to pick a credential.
    fn complete(
        &self,
        question_number: u32,
        context: &str,
        prompt: &str,
    ) -> impl Future<Output = Result<String, CompletionError>> + Send;
}

/// Credential bucket for a question: 1-6, 7-12, 13-18, then everything else.
pub fn bucket_for(question_number: u32) -> usize {
    match question_number {
        0..=6 => 0,
        7..=12 => 1,
        13..=18 => 2,
        _ => 3,
    }
}

/// Credentials spread across [`KEY_BUCKETS`] buckets.
#[derive(Clone)]
pub struct KeyRing {
    keys: [Option<String>; KEY_BUCKETS],
}

impl KeyRing {
    pub fn new(keys: [Option<String>; KEY_BUCKETS]) -> Self {
        Self { keys }
    }

    /// Key for `question_number`. A missing key only affects its own bucket.
    pub fn key_for(&self, question_number: u32) -> Result<&str, CompletionError> {
        let bucket = bucket_for(question_number);
        self.keys[bucket]
            .as_deref()
            .ok_or(CompletionError::MissingCredential { bucket: bucket + 1, question: question_number })
    }
}

// Never print credentials
impl std::fmt::Debug for KeyRing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let set: Vec<bool> = self.keys.iter().map(Option::is_some).collect();
        f.debug_struct("KeyRing").field("configured", &set).finish()
    }
}

/// Creates a reqwest client configured for the completion API.
fn build_client(config: &CompletionConfig) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(config.timeout)
        .build()
}

/// Gemini `generateContent` client.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    keys: KeyRing,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(config: &CompletionConfig) -> Result<Self, CompletionError> {
        Ok(Self {
            http: build_client(config)?,
            keys: KeyRing::new(config.keys.clone()),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

impl CompletionService for GeminiClient {
    async fn complete(&self, question_number: u32, context: &str, prompt: &str) -> Result<String, CompletionError> {
        let key = self.keys.key_for(question_number)?;
        let url = self.endpoint();

        tracing::debug!(
            "Requesting completion for question #{} from {} ({} bytes of context)",
            question_number,
            url,
            context.len()
        );

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", key)
            .json(&GenerateContentRequest::new(context, prompt))
            .send()
            .await?; // Propagates reqwest::Error as CompletionError::Network

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Completion request failed with {} for question #{}", status, question_number);
            return Err(CompletionError::Http(status, body));
        }

        let parsed: GenerateContentResponse = response.json().await?;
        parsed.text().ok_or(CompletionError::EmptyResponse)
    }
}
