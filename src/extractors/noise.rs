// src/extractors/noise.rs
use crate::document::models::FOOTER_TOKEN;

/// Running title printed on every page of the filing.
pub const RUNNING_TITLE: &str = "Formulário de Referência";
/// Version stamp printed in the page header.
pub const VERSION_STAMP: &str = "Versão";
/// Lines must be longer than this (in characters) to count as content.
pub const MIN_CONTENT_CHARS: usize = 2;

// Marker lines left behind by the text producer, with one or two spaces
const MARKER_FRAGMENTS: [&str; 2] = ["---  PÁGINA", "--- PÁGINA"];

/// Separates content lines from page furniture (footers, running headers,
/// version stamps, bare page numbers, short fragments).
#[derive(Debug, Clone)]
pub struct NoiseFilter {
    running_title: String,
    version_stamp: String,
    footer_token: String,
}

impl Default for NoiseFilter {
    fn default() -> Self {
        Self {
            running_title: RUNNING_TITLE.to_string(),
            version_stamp: VERSION_STAMP.to_string(),
            footer_token: FOOTER_TOKEN.to_string(),
        }
    }
}

impl NoiseFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_running_title(mut self, title: impl Into<String>) -> Self {
        self.running_title = title.into();
        self
    }

    pub fn with_version_stamp(mut self, stamp: impl Into<String>) -> Self {
        self.version_stamp = stamp.into();
        self
    }

    pub fn with_footer_token(mut self, token: impl Into<String>) -> Self {
        self.footer_token = token.into();
        self
    }

    /// Tests the trimmed form of `line`; callers keep the original line.
    pub fn is_content(&self, line: &str) -> bool {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            return false;
        }
        if trimmed.chars().count() <= MIN_CONTENT_CHARS {
            return false;
        }
        if trimmed.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
        if self.is_furniture(trimmed) {
            return false;
        }
        !MARKER_FRAGMENTS.iter().any(|marker| trimmed.contains(marker))
    }

    /// Whether `line` carries the footer, running title or version stamp.
    pub fn is_furniture(&self, line: &str) -> bool {
        contains_token(line, &self.footer_token)
            || contains_token(line, &self.running_title)
            || contains_token(line, &self.version_stamp)
    }

    /// Keeps content lines of `text`, untrimmed, in order.
    pub fn content_lines<'t>(&self, text: &'t str) -> Vec<&'t str> {
        text.lines().filter(|line| self.is_content(line)).collect()
    }
}

// An empty token never matches
fn contains_token(line: &str, token: &str) -> bool {
    !token.is_empty() && line.contains(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_furniture() {
        let filter = NoiseFilter::new();

        assert!(!filter.is_content(""));
        assert!(!filter.is_content("   \t"));
        assert!(!filter.is_content("123"));
        assert!(!filter.is_content("  42  "));
        assert!(!filter.is_content("ab"));
        assert!(!filter.is_content("Versão"));
        assert!(!filter.is_content("Versão : 7"));
        assert!(!filter.is_content("Formulário de Referência - 2024 - ACME S.A."));
        assert!(!filter.is_content("PÁGINA: 12 de 340"));
        assert!(!filter.is_content("---  PÁGINA 3 ---"));
    }

    #[test]
    fn keeps_real_lines() {
        let filter = NoiseFilter::new();
        assert!(filter.is_content("abc"));
        assert!(filter.is_content("The company has 3 subsidiaries."));
        assert!(filter.is_content("2023 2024"));
    }

    #[test]
    fn content_lines_preserve_original_whitespace() {
        let filter = NoiseFilter::new();
        let text = "    indented content\n7\n\nPÁGINA: 2 de 3\ntrailing   ";
        let kept = filter.content_lines(text);
        assert_eq!(kept, vec!["    indented content", "trailing   "]);
    }

    #[test]
    fn tokens_are_configurable() {
        let filter = NoiseFilter::new()
            .with_running_title("Annual Report")
            .with_version_stamp("Rev.")
            .with_footer_token("Page:");

        assert!(!filter.is_content("Annual Report 2024"));
        assert!(!filter.is_content("Rev. 3"));
        assert!(!filter.is_content("Page: 4 of 10"));
        assert!(filter.is_content("Formulário de Referência"));
        assert!(filter.is_furniture("Page: 4 of 10"));
        assert!(!filter.is_furniture("PÁGINA: 4 de 10"));
    }
}
