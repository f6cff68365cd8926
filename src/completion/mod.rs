// src/completion/mod.rs
pub mod client;
pub mod models;

pub use client::{CompletionService, GeminiClient};
