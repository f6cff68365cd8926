// src/config.rs
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::document::models::FOOTER_TOKEN;
use crate::extractors::index::INDEX_MARKER;
use crate::extractors::noise::{RUNNING_TITLE, VERSION_STAMP};
use crate::utils::AppError;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_MAX_UPLOAD_MB: usize = 100;
const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Number of credential buckets questions are spread across.
pub const KEY_BUCKETS: usize = 4;

/// Settings for the completion service client.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// `GEMINI_KEY_1` .. `GEMINI_KEY_4`; bucket `i` uses `keys[i]`.
    pub keys: [Option<String>; KEY_BUCKETS],
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            keys: Default::default(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Tokens that identify the index page and page furniture. The defaults fit
/// the Formulário de Referência; other filing families override them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionConfig {
    pub index_marker: String,
    pub running_title: String,
    pub version_stamp: String,
    pub footer_token: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            index_marker: INDEX_MARKER.to_string(),
            running_title: RUNNING_TITLE.to_string(),
            version_stamp: VERSION_STAMP.to_string(),
            footer_token: FOOTER_TOKEN.to_string(),
        }
    }
}

/// Application configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub completion: CompletionConfig,
    pub extraction: ExtractionConfig,
    /// JSON question catalog (`QUESTIONS_PATH`).
    pub questions_path: Option<PathBuf>,
    pub bind_addr: SocketAddr,
    pub max_upload_bytes: usize,
    pub queue_capacity: usize,
}

impl AppConfig {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick
    /// up a `.env` file.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty values count as unset
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mut keys: [Option<String>; KEY_BUCKETS] = Default::default();
        for (i, key) in keys.iter_mut().enumerate() {
            *key = get(&format!("GEMINI_KEY_{}", i + 1));
        }

        let timeout_secs = match get("COMPLETION_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| AppError::Config(format!("COMPLETION_TIMEOUT_SECS is not a number: '{}'", raw)))?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let bind_raw = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|e| AppError::Config(format!("Invalid BIND_ADDR '{}': {}", bind_raw, e)))?;

        let max_upload_mb = match get("MAX_UPLOAD_MB") {
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|_| AppError::Config(format!("MAX_UPLOAD_MB is not a number: '{}'", raw)))?,
            None => DEFAULT_MAX_UPLOAD_MB,
        };

        let config = Self {
            completion: CompletionConfig {
                keys,
                model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                base_url: get("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                timeout: Duration::from_secs(timeout_secs),
            },
            extraction: ExtractionConfig {
                index_marker: get("INDEX_MARKER").unwrap_or_else(|| INDEX_MARKER.to_string()),
                running_title: get("RUNNING_TITLE").unwrap_or_else(|| RUNNING_TITLE.to_string()),
                version_stamp: get("VERSION_STAMP").unwrap_or_else(|| VERSION_STAMP.to_string()),
                footer_token: get("FOOTER_TOKEN").unwrap_or_else(|| FOOTER_TOKEN.to_string()),
            },
            questions_path: get("QUESTIONS_PATH").map(PathBuf::from),
            bind_addr,
            max_upload_bytes: max_upload_mb * 1024 * 1024,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        };

        let configured = config.completion.keys.iter().filter(|k| k.is_some()).count();
        tracing::debug!("Loaded configuration: {} of {} completion keys set", configured, KEY_BUCKETS);
        if configured < KEY_BUCKETS {
            tracing::warn!("Only {} of {} GEMINI_KEY_* variables are set", configured, KEY_BUCKETS);
        }

        Ok(config)
    }
}
