// src/questions/mod.rs
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::extractors::SectionNumber;
use crate::utils::AppError;

/// One catalog entry: which sections to read and what to ask about them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// 1-based number; also selects the completion credential bucket.
    pub number: u32,
    /// Sections whose text is given to the completion service.
    pub sections: Vec<SectionNumber>,
    pub text: String,
    /// Required answer format.
    #[serde(default)]
    pub how_to_fill: String,
    #[serde(default)]
    pub observations: String,
}

impl Question {
    pub fn prompt(&self) -> String {
        let mut prompt = format!("{}\n\nReturn only as requested here: {}", self.text.trim(), self.how_to_fill.trim());
        if !self.observations.trim().is_empty() {
            prompt.push_str("\n\n");
            prompt.push_str(self.observations.trim());
        }
        prompt
    }
}

/// Ordered list of questions driving extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionCatalog {
    questions: Vec<Question>,
}

impl QuestionCatalog {
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    /// Parses a JSON array of questions.
    pub fn from_json(raw: &str) -> Result<Self, AppError> {
        let questions: Vec<Question> = serde_json::from_str(raw)?;
        if let Some(q) = questions.iter().find(|q| q.sections.is_empty()) {
            return Err(AppError::Config(format!("Question #{} lists no sections", q.number)));
        }
        Ok(Self::new(questions))
    }

    pub fn load(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Cannot read question catalog {}: {}", path.display(), e)))?;
        let catalog = Self::from_json(&raw)?;
        if catalog.is_empty() {
            return Err(AppError::Config(format!("Question catalog {} has no questions", path.display())));
        }
        tracing::info!("Loaded {} questions from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}
