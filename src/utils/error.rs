// src/utils/error.rs
use thiserror::Error;

// Define specific error types for different parts of the application
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// The section number never appears in a recognizable index entry and the
    /// fallback range produced no text either.
    #[error("Error: section number '{0}' not found in index")]
    SectionNotFoundInIndex(String),

    /// The index pointed at a page but the heading could not be confirmed there.
    #[error("Error: could not locate section content on indicated page {page} (section '{section}')")]
    HeadingNotLocated { section: String, page: u32 },

    #[error("Invalid section number: '{0}'")]
    InvalidSectionNumber(String),

    #[error("Regular expression error: {0}")]
    Regex(String),
}

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Error reading file: {0}")]
    Read(String),

    #[error("PDF text extraction failed: {0}")]
    Pdf(String),

    #[error("Document produced no text")]
    EmptyDocument,
}

#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("No credential configured for question #{question} (set GEMINI_KEY_{bucket})")]
    MissingCredential { bucket: usize, question: u32 },

    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error), // Automatically convert reqwest errors

    #[error("HTTP error {0}: {1}")]
    Http(reqwest::StatusCode, String),

    #[error("Completion service returned no text")]
    EmptyResponse,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("Task ID not found: {0}")]
    NotFound(String),

    #[error("Task {id} cannot move from {from} to {to}")]
    InvalidTransition { id: String, from: String, to: String },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Convert(#[from] ConvertError),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("{0}")]
    Completion(#[from] CompletionError),

    #[error("Task store error: {0}")]
    Task(#[from] TaskError),

    #[error("Server error: {0}")]
    Server(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_errors_render_user_facing_templates() {
        let missing = ExtractError::SectionNotFoundInIndex("9.9".to_string());
        assert!(missing.to_string().contains("section number '9.9' not found in index"));

        let heading = ExtractError::HeadingNotLocated { section: "7.1".to_string(), page: 4 };
        assert!(heading
            .to_string()
            .contains("could not locate section content on indicated page 4"));
    }

    #[test]
    fn convert_errors_pass_through_app_error_verbatim() {
        let err: AppError = ConvertError::FileNotFound("doc.pdf".to_string()).into();
        assert_eq!(err.to_string(), "File not found: doc.pdf");
    }
}
