// src/extractors/index.rs

// --- Imports ---
use once_cell::sync::Lazy;
use regex::Regex;

use crate::document::Document;
use crate::extractors::noise::NoiseFilter;
use crate::extractors::number::SectionNumber;
use crate::utils::error::ExtractError;

// --- Constants ---
/// Token that marks a table-of-contents page.
pub const INDEX_MARKER: &str = "Índice";
/// Pages at these ordinal positions are treated as front matter (possible
/// index pages) even without [`INDEX_MARKER`].
pub const FRONT_MATTER_PAGES: usize = 5;

// Title stops at end of line; the page number may trail on the same line
// (after spaces or dot leaders) or sit alone on the following line.
const ENTRY_TAIL: &str = r"[ \t]+(?P<title>[^\n]+?)[\s.]*(?P<page>\d+)[ \t]*\r?$";

// --- Regex Patterns (Lazy Static) ---
// Any "<dotted number> <title> <page>" entry. The leading group keeps "17.1"
// or "7.1.2" from matching as "7.1".
static ANY_ENTRY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?m)(?:^|[^\d.])(?P<number>\d+(?:\.\d+)*){}", ENTRY_TAIL))
        .expect("Failed to compile ANY_ENTRY_RE")
});

// --- Data Structures ---
/// One parsed table-of-contents line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub number: SectionNumber,
    pub title: String,
    pub page: u32,
}

/// Where the index says a section starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexHit {
    /// Page number the section starts on, as printed in the index.
    pub page: u32,
    /// Ordinal position of the index page the entry was read from.
    pub index_page: usize,
    pub title: String,
}

/// Builds the entry pattern for one specific section number.
pub fn entry_pattern(target: &SectionNumber) -> Result<Regex, ExtractError> {
    let pattern = format!(r"(?m)(?:^|[^\d.]){}{}", regex::escape(&target.to_string()), ENTRY_TAIL);
    Regex::new(&pattern).map_err(|e| ExtractError::Regex(e.to_string()))
}

/// Blanks footer, running-title and version lines so they cannot be read as
/// entries ("PÁGINA: 1 de 3" looks like section 1 on page 3). Line count is
/// preserved.
fn strip_furniture(text: &str, noise: &NoiseFilter) -> String {
    text.lines()
        .map(|line| if noise.is_furniture(line) { "" } else { line })
        .collect::<Vec<_>>()
        .join("\n")
}

// --- Locator ---
/// Finds the page a section starts on by reading the document's index.
#[derive(Debug, Clone)]
pub struct IndexLocator {
    index_marker: String,
    front_matter_pages: usize,
    /// Furniture tokens blanked before entries are parsed
    noise: NoiseFilter,
}

impl Default for IndexLocator {
    fn default() -> Self {
        Self {
            index_marker: INDEX_MARKER.to_string(),
            front_matter_pages: FRONT_MATTER_PAGES,
            noise: NoiseFilter::default(),
        }
    }
}

impl IndexLocator {
    pub fn with_index_marker(mut self, marker: impl Into<String>) -> Self {
        self.index_marker = marker.into();
        self
    }

    pub fn with_noise_filter(mut self, noise: NoiseFilter) -> Self {
        self.noise = noise;
        self
    }

    /// Every well-formed entry on `text`, in order of appearance. Lines that
    /// look like entries but carry unparsable numbers are skipped.
    pub fn entries(&self, text: &str) -> Vec<IndexEntry> {
        let text = strip_furniture(text, &self.noise);
        ANY_ENTRY_RE
            .captures_iter(&text)
            .filter_map(|caps| {
                Some(IndexEntry {
                    number: caps["number"].parse().ok()?,
                    title: caps["title"].trim().to_string(),
                    page: caps["page"].parse().ok()?,
                })
            })
            .collect()
    }

    /// First index entry for `target` in document order, or `None`.
    ///
    /// A page is only searched when it mentions `"<target> "` and is either
    /// marked as an index page or sits among the first few pages.
    pub fn locate(&self, document: &Document, target: &SectionNumber) -> Result<Option<IndexHit>, ExtractError> {
        let needle = format!("{} ", target);
        let pattern = entry_pattern(target)?;

        for (ordinal, page) in document.pages().iter().enumerate() {
            if !page.raw_text.contains(&needle) {
                continue;
            }
            let is_index_page =
                page.raw_text.contains(&self.index_marker) || ordinal < self.front_matter_pages;
            if !is_index_page {
                continue;
            }

            // Earliest entry on the page whose page number parses
            let text = strip_furniture(&page.raw_text, &self.noise);
            let hit = pattern.captures_iter(&text).find_map(|caps| {
                Some(IndexHit {
                    page: caps["page"].parse().ok()?,
                    index_page: ordinal,
                    title: caps["title"].trim().to_string(),
                })
            });

            if let Some(hit) = hit {
                tracing::debug!(
                    "Index entry for {} found on page ordinal {}: '{}' -> page {}",
                    target,
                    ordinal,
                    hit.title,
                    hit.page
                );
                return Ok(Some(hit));
            }
        }

        tracing::debug!("No index entry found for {}", target);
        Ok(None)
    }
}
