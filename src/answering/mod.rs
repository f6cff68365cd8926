// src/answering/mod.rs
use std::sync::Arc;

use indexmap::IndexMap;

use crate::completion::CompletionService;
use crate::document::Document;
use crate::extractors::{SectionExtractor, SectionNumber};
use crate::questions::QuestionCatalog;
use crate::utils::error::CompletionError;
use crate::utils::AppError;

/// Question text mapped to its answer, in catalog order.
pub type Answers = IndexMap<String, String>;

/// Remembers the text of the most recently extracted section list.
/// Consecutive questions over the same sections reuse it.
#[derive(Debug, Default)]
pub struct SectionCache {
    sections: Option<Vec<SectionNumber>>,
    text: String,
    misses: usize,
}

impl SectionCache {
    pub fn get_or_extract(
        &mut self,
        extractor: &SectionExtractor,
        document: &Document,
        sections: &[SectionNumber],
    ) -> &str {
        if self.sections.as_deref() != Some(sections) {
            self.text = extractor.extract_many(document, sections);
            self.sections = Some(sections.to_vec());
            self.misses += 1;
        }
        &self.text
    }

    /// Number of times extraction actually ran.
    pub fn misses(&self) -> usize {
        self.misses
    }
}

/// Runs every catalog question against one document.
pub struct QuestionAnswerer<C> {
    extractor: SectionExtractor,
    completion: C,
    catalog: Arc<QuestionCatalog>,
}

impl<C: CompletionService> QuestionAnswerer<C> {
    pub fn new(extractor: SectionExtractor, completion: C, catalog: Arc<QuestionCatalog>) -> Self {
        Self { extractor, completion, catalog }
    }

    pub fn catalog(&self) -> &QuestionCatalog {
        &self.catalog
    }

    /// Answers the catalog in order, reporting `(current, total)` before each
    /// question.
    ///
    /// A failed completion becomes an `"ERROR: ..."` answer and the loop goes
    /// on. A missing credential aborts the run.
    pub async fn run<F>(&self, full_text: &str, mut progress: F) -> Result<Answers, AppError>
    where
        F: FnMut(usize, usize) + Send,
    {
        let document = Document::split(full_text);
        let questions = self.catalog.questions();
        let total = questions.len();
        let mut cache = SectionCache::default();
        let mut answers = Answers::new();

        progress(0, total);

        for (index, question) in questions.iter().enumerate() {
            progress(index + 1, total);
            tracing::info!("Processing question {}/{}", index + 1, total);

            let context = cache.get_or_extract(&self.extractor, &document, &question.sections).to_string();

            match self.completion.complete(question.number, &context, &question.prompt()).await {
                Ok(answer) => {
                    tracing::info!("Question {} answered", index + 1);
                    answers.insert(question.text.clone(), answer);
                }
                Err(e @ CompletionError::MissingCredential { .. }) => return Err(e.into()),
                Err(e) => {
                    tracing::error!("Error on question {}: {}", index + 1, e);
                    answers.insert(question.text.clone(), format!("ERROR: {}", e));
                }
            }
        }

        tracing::info!("Answered {} questions ({} extractions)", total, cache.misses());
        Ok(answers)
    }
}
