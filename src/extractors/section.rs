// src/extractors/section.rs

// --- Imports ---
use std::collections::HashSet;

use regex::Regex;
use serde::Serialize;

use crate::config::ExtractionConfig;
use crate::document::Document;
use crate::extractors::boundary::SiblingBoundaryResolver;
use crate::extractors::index::{IndexHit, IndexLocator};
use crate::extractors::noise::NoiseFilter;
use crate::extractors::number::SectionNumber;
use crate::extractors::range::{is_heading_line, normalize, PageSpan, RangeExtractor, LOOKAHEAD_PAGES};
use crate::utils::error::ExtractError;

// --- Constants ---
/// Minimum number of characters that must follow the first letter of a
/// heading title for the heading to be confirmed on its page.
pub const MIN_HEADING_TITLE_CHARS: usize = 10;

// --- Data Structures ---
/// How the extracted text was obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractionStrategy {
    /// Start page from the index, upper bound from the next sibling (if any).
    Index {
        start_page: u32,
        end_page: Option<u32>,
        next_section: Option<String>,
    },
    /// The section was missing from the index; text comes from the range
    /// between its syntactic neighbours.
    Fallback { prev: String, next: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedSection {
    pub section_number: String,
    /// Heading line as found on the page (index path only)
    pub section_title: Option<String>,
    pub content: String,
    pub strategy: ExtractionStrategy,
}

/// `Ok` carries the section text, `Err` a user-facing "not found" message.
pub type ExtractionOutcome = Result<ExtractedSection, ExtractError>;

/// Renders an outcome as plain text: the content, or the failure message.
pub fn outcome_text(outcome: &ExtractionOutcome) -> String {
    match outcome {
        Ok(section) => section.content.clone(),
        Err(e) => e.to_string(),
    }
}

/// Builds the heading pattern: the number at line start, then a title that
/// begins with a letter and carries at least [`MIN_HEADING_TITLE_CHARS`]
/// more characters. The title may start on the next line.
pub fn heading_pattern(target: &SectionNumber) -> Result<Regex, ExtractError> {
    let pattern = format!(
        r"(?m)^{}\s+([A-Za-zÀ-ÿ].{{{},}})$",
        regex::escape(&target.to_string()),
        MIN_HEADING_TITLE_CHARS
    );
    Regex::new(&pattern).map_err(|e| ExtractError::Regex(e.to_string()))
}

// --- Main Extractor Structure ---
/// Extracts the text of a numbered section from a paginated document using
/// only its table of contents and rendered text.
///
/// Stateless between calls: the same document and target always produce the
/// same outcome, and one extractor can serve many threads.
#[derive(Debug, Clone, Default)]
pub struct SectionExtractor {
    locator: IndexLocator,
    boundaries: SiblingBoundaryResolver,
    ranges: RangeExtractor,
}

impl SectionExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extractor for the filing family described by `config`.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new().with_index_marker(config.index_marker.as_str()).with_noise_filter(
            NoiseFilter::new()
                .with_running_title(config.running_title.as_str())
                .with_version_stamp(config.version_stamp.as_str())
                .with_footer_token(config.footer_token.as_str()),
        )
    }

    /// Furniture tokens for both content cleaning and index parsing.
    pub fn with_noise_filter(mut self, noise: NoiseFilter) -> Self {
        self.locator = self.locator.with_noise_filter(noise.clone());
        self.ranges = RangeExtractor::new(noise);
        self
    }

    pub fn with_index_marker(mut self, marker: impl Into<String>) -> Self {
        self.locator = self.locator.with_index_marker(marker);
        self
    }

    /// Extracts section `target` from `document`.
    pub fn extract_section(&self, document: &Document, target: &SectionNumber) -> ExtractionOutcome {
        tracing::info!("Extracting section {}", target);

        // 1. Find the start page in the index
        let Some(hit) = self.locator.locate(document, target)? else {
            return self.extract_fallback(document, target);
        };

        // 2. Confirm the heading on the indicated page
        let heading = heading_pattern(target)?;
        let Some((heading_ordinal, title, remainder)) = self.find_heading(document, &hit, &heading) else {
            tracing::warn!("Heading for {} not found on page {}", target, hit.page);
            return Err(ExtractError::HeadingNotLocated { section: target.to_string(), page: hit.page });
        };
        tracing::debug!("Confirmed heading '{}' on page ordinal {}", title, heading_ordinal);

        // 3. Where does the next same-or-shallower section begin?
        let boundary = self.boundaries.next_boundary(&self.locator, document, target, &hit);
        let guard = boundary.as_ref().map(|b| &b.next_section);
        let guard_text = guard.map(|g| g.to_string());

        // 4. Rest of the start page, cut at the guard heading if it is there too
        let mut lines: Vec<&str> = Vec::new();
        for line in remainder.lines() {
            if guard_text.as_deref().is_some_and(|g| is_heading_line(line, g)) {
                break;
            }
            if self.ranges.noise().is_content(line) {
                lines.push(line);
            }
        }

        // 5. Following pages up to the boundary
        let span = PageSpan::new(hit.page, boundary.as_ref().map(|b| b.page)).after_start();
        let skip = HashSet::from([heading_ordinal, hit.index_page]);
        let following = self.ranges.extract(document, span, guard, &skip);

        let content = [normalize(&lines), following]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        tracing::info!("Extracted section {} ({} bytes)", target, content.len());

        Ok(ExtractedSection {
            section_number: target.to_string(),
            section_title: Some(title),
            content,
            strategy: ExtractionStrategy::Index {
                start_page: hit.page,
                end_page: boundary.as_ref().map(|b| b.page),
                next_section: guard_text,
            },
        })
    }

    /// Extracts every target and joins the texts (or failure messages) with a
    /// blank line, in the order given.
    pub fn extract_many(&self, document: &Document, targets: &[SectionNumber]) -> String {
        targets
            .iter()
            .map(|target| outcome_text(&self.extract_section(document, target)))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// First page addressed as `hit.page` that carries the heading. The index
    /// page itself only qualifies when its own marker is that page.
    fn find_heading<'d>(&self, document: &'d Document, hit: &IndexHit, heading: &Regex) -> Option<(usize, String, &'d str)> {
        document
            .pages_containing(hit.page)
            .filter(|(ordinal, page)| *ordinal != hit.index_page || page.number == Some(hit.page))
            .find_map(|(ordinal, page)| {
                let found = heading.find(&page.raw_text)?;
                let title = found.as_str().split_whitespace().collect::<Vec<_>>().join(" ");
                Some((ordinal, title, &page.raw_text[found.end()..]))
            })
    }

    /// Best-effort text between the target's syntactic neighbours.
    fn extract_fallback(&self, document: &Document, target: &SectionNumber) -> ExtractionOutcome {
        let range = target.fallback_range();
        tracing::warn!(
            "Section {} not found in index, trying fallback range {}..{}",
            target,
            range.prev,
            range.next
        );

        let prev_hit = self.locator.locate(document, &range.prev)?;
        let next_hit = self.locator.locate(document, &range.next)?;

        let start = match (&prev_hit, &next_hit) {
            (Some(prev), _) => prev.page,
            (None, Some(next)) => next.page.saturating_sub(LOOKAHEAD_PAGES).max(1),
            (None, None) => {
                tracing::warn!("Fallback failed for section {}", target);
                return Err(ExtractError::SectionNotFoundInIndex(target.to_string()));
            }
        };
        // The next neighbour's start page is read too
        let end = next_hit.as_ref().map(|next| next.page.saturating_add(1));

        let skip: HashSet<usize> = prev_hit.iter().chain(next_hit.iter()).map(|hit| hit.index_page).collect();
        let content = self.ranges.extract(document, PageSpan::new(start, end), None, &skip);

        if content.is_empty() {
            tracing::warn!("Fallback failed for section {}", target);
            return Err(ExtractError::SectionNotFoundInIndex(target.to_string()));
        }

        tracing::info!("Fallback succeeded: extracted {} from {} to {}", target, range.prev, range.next);
        Ok(ExtractedSection {
            section_number: target.to_string(),
            section_title: None,
            content,
            strategy: ExtractionStrategy::Fallback {
                prev: range.prev.to_string(),
                next: range.next.to_string(),
            },
        })
    }
}
