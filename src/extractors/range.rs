// src/extractors/range.rs
use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::document::Document;
use crate::extractors::noise::NoiseFilter;
use crate::extractors::number::SectionNumber;

/// Pages read past the start page when no upper boundary is known.
pub const LOOKAHEAD_PAGES: u32 = 10;

static BLANK_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n\s*\n+").expect("Failed to compile BLANK_RUN_RE"));

/// Whether `line` opens with `number` as a heading: the number at the very
/// start, followed by whitespace or nothing.
pub fn is_heading_line(line: &str, number: &str) -> bool {
    line.strip_prefix(number)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
}

/// Joins lines, collapses runs of blank lines to a single blank line and trims.
pub fn normalize(lines: &[&str]) -> String {
    let joined = lines.join("\n");
    BLANK_RUN_RE.replace_all(&joined, "\n\n").trim().to_string()
}

/// A page window `[start, end)`; `end` defaults to the look-ahead window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSpan {
    pub start: u32,
    pub end: Option<u32>,
    /// Whether pages addressed as `start` are read.
    pub include_start: bool,
}

impl PageSpan {
    pub fn new(start: u32, end: Option<u32>) -> Self {
        Self { start, end, include_start: true }
    }

    /// Same window without the start page, for callers that already consumed it.
    pub fn after_start(mut self) -> Self {
        self.include_start = false;
        self
    }

    /// Exclusive upper bound. A missing or inverted bound falls back to
    /// `start + LOOKAHEAD_PAGES` inclusive.
    pub fn end_exclusive(&self) -> u32 {
        match self.end {
            Some(end) if end > self.start => end,
            _ => self.start.saturating_add(LOOKAHEAD_PAGES + 1),
        }
    }
}

/// Pulls cleaned content lines out of a range of pages.
#[derive(Debug, Clone, Default)]
pub struct RangeExtractor {
    noise: NoiseFilter,
}

impl RangeExtractor {
    pub fn new(noise: NoiseFilter) -> Self {
        Self { noise }
    }

    pub fn noise(&self) -> &NoiseFilter {
        &self.noise
    }

    /// Cleaned text of every page in `span`, skipping page ordinals in `skip`.
    /// Pages after `span.start` that open a line with `guard` end the
    /// extraction. The window never runs past the document's last page.
    pub fn extract(
        &self,
        document: &Document,
        span: PageSpan,
        guard: Option<&SectionNumber>,
        skip: &HashSet<usize>,
    ) -> String {
        let guard = guard.map(|g| g.to_string());
        let end = span.end_exclusive().min(document.last_page().saturating_add(1));
        let first = if span.include_start { span.start } else { span.start.saturating_add(1) };

        tracing::debug!("Sweeping pages {}..{} (guard: {:?})", first, end, guard);

        // Each page is read at most once, in page-number order
        let mut visited = skip.clone();
        let mut lines = Vec::new();

        'pages: for page_number in first..end {
            for (ordinal, page) in document.pages_containing(page_number) {
                if !visited.insert(ordinal) {
                    continue;
                }

                if page_number > span.start {
                    if let Some(guard) = &guard {
                        if page.raw_text.lines().any(|line| is_heading_line(line, guard)) {
                            tracing::debug!(
                                "Heading {} found on page {} before the boundary, stopping",
                                guard,
                                page_number
                            );
                            break 'pages;
                        }
                    }
                }

                lines.extend(self.noise.content_lines(&page.raw_text));
            }
        }

        normalize(&lines)
    }
}
