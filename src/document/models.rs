// src/document/models.rs
use once_cell::sync::Lazy;
use regex::Regex;

/// Delimiter the text producer writes before every page number.
/// The full marker line reads `---  PÁGINA <n> ---` (note the two spaces).
pub const PAGE_DELIMITER: &str = "---  PÁGINA ";

/// Footer printed by the filing itself, e.g. `PÁGINA: 12 de 340`.
pub const FOOTER_TOKEN: &str = "PÁGINA:";

// Remainder of a marker line right after the delimiter: "<n> ---"
static MARKER_TAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)[ \t]*-{3}[ \t]*\r?\n?").expect("Failed to compile MARKER_TAIL_RE"));

static FOOTER_PAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"PÁGINA:\s*(\d+)").expect("Failed to compile FOOTER_PAGE_RE"));

/// One page of converted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Number printed in the page marker. `None` only for text that precedes
    /// the first marker.
    pub number: Option<u32>,
    /// Page text with the marker line removed.
    pub raw_text: String,
}

impl Page {
    /// Whether this page can be addressed as page `number`: its own marker,
    /// a bare printed page-number line, or the filing footer bearing it.
    pub fn mentions_page(&self, number: u32) -> bool {
        if self.number == Some(number) {
            return true;
        }
        let token = number.to_string();
        if self.raw_text.lines().any(|line| line.trim() == token) {
            return true;
        }
        FOOTER_PAGE_RE
            .captures_iter(&self.raw_text)
            .any(|caps| caps[1].parse::<u32>().ok() == Some(number))
    }
}

/// An ordered, immutable sequence of pages.
///
/// Pages keep the order in which they appear in the text blob; the marker
/// number, not the position, is what identifies a page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pages: Vec<Page>,
}

impl Document {
    /// Splits a page-tagged text blob on [`PAGE_DELIMITER`].
    pub fn split(full_text: &str) -> Self {
        let mut pages = Vec::new();

        for (position, fragment) in full_text.split(PAGE_DELIMITER).enumerate() {
            match MARKER_TAIL_RE.captures(fragment) {
                Some(caps) if position > 0 => {
                    let body_start = caps.get(0).map_or(0, |m| m.end());
                    pages.push(Page {
                        number: caps[1].parse().ok(),
                        raw_text: fragment[body_start..].to_string(),
                    });
                }
                _ => {
                    // Preamble before the first marker (usually just a newline)
                    if fragment.trim().is_empty() {
                        continue;
                    }
                    tracing::trace!("Keeping unnumbered fragment at position {}", position);
                    pages.push(Page { number: None, raw_text: fragment.to_string() });
                }
            }
        }

        tracing::debug!("Split document into {} pages", pages.len());
        Self { pages }
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page(&self, ordinal: usize) -> Option<&Page> {
        self.pages.get(ordinal)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Highest page number a sweep can reach: the largest marker number, or
    /// the page count when no page carries a marker.
    pub fn last_page(&self) -> u32 {
        self.pages
            .iter()
            .filter_map(|page| page.number)
            .max()
            .unwrap_or_else(|| u32::try_from(self.pages.len()).unwrap_or(u32::MAX))
    }

    /// All pages (with their ordinal position) that can be addressed as page
    /// `number`, in document order. Several matches are normal: converters
    /// sometimes place markers mid-content.
    pub fn pages_containing(&self, number: u32) -> impl Iterator<Item = (usize, &Page)> + '_ {
        self.pages
            .iter()
            .enumerate()
            .filter(move |(_, page)| page.mentions_page(number))
    }
}
