// src/extractors/boundary.rs
use crate::document::Document;
use crate::extractors::index::{IndexHit, IndexLocator};
use crate::extractors::number::SectionNumber;

/// End of a section's page range, taken from the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boundary {
    /// The first same-or-shallower section listed after the target. Its
    /// heading is the guard that stops extraction early.
    pub next_section: SectionNumber,
    /// Exclusive upper page bound; always greater than the start page.
    pub page: u32,
}

/// Finds where the next section at the same or a shallower depth begins.
#[derive(Debug, Clone, Default)]
pub struct SiblingBoundaryResolver;

impl SiblingBoundaryResolver {
    /// Re-reads the index page the target was found on and returns the first
    /// entry after the target's own entry whose level is `<=` the target's.
    ///
    /// When that entry lists a page at or before the start page (sections
    /// sharing a page, or a mis-parsed entry) the bound is clamped to the page
    /// after the start, so only the start page is read.
    pub fn next_boundary(
        &self,
        locator: &IndexLocator,
        document: &Document,
        target: &SectionNumber,
        hit: &IndexHit,
    ) -> Option<Boundary> {
        let index_page = document.page(hit.index_page)?;
        let entries = locator.entries(&index_page.raw_text);

        let position = entries.iter().position(|entry| &entry.number == target)?;
        let next = entries[position + 1..]
            .iter()
            .find(|entry| entry.number.level() <= target.level())?;

        let page = next.page.max(hit.page.saturating_add(1));
        if page != next.page {
            tracing::debug!(
                "Boundary {} lists page {} (start {}), clamping to {}",
                next.number,
                next.page,
                hit.page,
                page
            );
        }

        tracing::debug!("Section {} ends before page {} (next: {})", target, page, next.number);
        Some(Boundary { next_section: next.number.clone(), page })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::convert::tag_pages;

    fn n(s: &str) -> SectionNumber {
        s.parse().unwrap()
    }

    fn boundary_for(index: &str, target: &str) -> Option<Boundary> {
        let document = Document::split(&tag_pages([index, "body"]));
        let target = n(target);
        let hit = IndexLocator::default().locate(&document, &target).unwrap()?;
        SiblingBoundaryResolver.next_boundary(&IndexLocator::default(), &document, &target, &hit)
    }

    const INDEX: &str = "Índice\n\
        7 Assembly and Management 10\n\
        7.1 Capital Structure 12\n\
        7.1.1 Shareholders 13\n\
        7.1.2 Agreements 15\n\
        7.2 Risk Factors 18\n\
        8 Related Parties 25\n";

    #[test]
    fn skips_deeper_entries() {
        let boundary = boundary_for(INDEX, "7.1").unwrap();
        assert_eq!(boundary.next_section, n("7.2"));
        assert_eq!(boundary.page, 18);
    }

    #[test]
    fn shallower_entry_also_bounds() {
        let boundary = boundary_for(INDEX, "7.2").unwrap();
        assert_eq!(boundary.next_section, n("8"));
        assert_eq!(boundary.page, 25);

        let boundary = boundary_for(INDEX, "7.1.1").unwrap();
        assert_eq!(boundary.next_section, n("7.1.2"));
        assert_eq!(boundary.page, 15);
    }

    #[test]
    fn last_entry_has_no_boundary() {
        assert!(boundary_for(INDEX, "8").is_none());
    }

    #[test]
    fn boundary_always_follows_start_page() {
        let index = "Índice\n7.1 Capital Structure 12\n7.2 Risk Factors 12\n7.3 Mis-parsed Entry 3\n";
        let boundary = boundary_for(index, "7.1").unwrap();
        assert_eq!(boundary.next_section, n("7.2"));
        assert_eq!(boundary.page, 13);

        // Start at the largest page number: the clamp saturates
        let index = "Índice\n7.1 Capital Structure 4294967295\n7.2 Risk Factors 3\n";
        assert_eq!(boundary_for(index, "7.1").unwrap().page, u32::MAX);

        for target in ["7", "7.1", "7.1.1", "7.1.2", "7.2"] {
            let document = Document::split(&tag_pages([INDEX, "body"]));
            let number = n(target);
            let hit = IndexLocator::default().locate(&document, &number).unwrap().unwrap();
            if let Some(b) = SiblingBoundaryResolver.next_boundary(&IndexLocator::default(), &document, &number, &hit) {
                assert!(b.page > hit.page, "{} boundary {} <= start {}", target, b.page, hit.page);
            }
        }
    }
}
