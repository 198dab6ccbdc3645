// Section Tracker — maintains the current section path/depth as the
// Chunk Builder walks headings and TOC-matching paragraphs. See spec.md
// §4.6/§3 (`sectionPath`, `sectionTitle`, `headingLevel`).

use serde::{Deserialize, Serialize};

use crate::model::Document;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PathEntry {
    title: String,
    level: u8,
}

/// Tracks the stack of active section headings while walking a document
/// top to bottom. A heading pops every entry at its level or deeper, then
/// pushes itself; deeper headings nest beneath it.
#[derive(Debug, Clone, Default)]
pub struct SectionTracker {
    stack: Vec<PathEntry>,
}

impl SectionTracker {
    pub fn new() -> Self {
        Self { stack: Vec::new() }
    }

    /// Enter a heading at `level`, updating the active path. Pop is
    /// length-based, not a comparison of stored levels (spec §4.6: "if L ≤
    /// currentDepth, pop the tail of path until len(path) < L") — a heading
    /// that is deeper than the current path, even if its level number isn't
    /// a clean increment (e.g. H1 then H5 then H3), nests beneath the path
    /// as-is rather than popping anything.
    pub fn enter_heading(&mut self, level: u8, title: &str) {
        while self.stack.len() >= level as usize {
            self.stack.pop();
        }
        self.stack.push(PathEntry {
            title: title.to_string(),
            level,
        });
        tracing::debug!(level, title, depth = self.stack.len(), "section path updated");
    }

    /// If `text` on `page` exactly matches a TOC entry, treat it as a
    /// heading at that entry's level (spec §4.6: TOC-matching paragraphs
    /// act like headings even without heading-element markup).
    pub fn maybe_enter_from_toc(&mut self, document: &Document, page: u32, text: &str) -> bool {
        if let Some(entry) = document.toc_entry_for(page, text) {
            self.enter_heading(entry.level, &entry.title);
            true
        } else {
            false
        }
    }

    /// Current section path, root to leaf. Empty before any heading has
    /// been seen.
    pub fn current_path(&self) -> Vec<String> {
        self.stack.iter().map(|e| e.title.clone()).collect()
    }

    /// Title of the innermost active heading, if any.
    pub fn current_title(&self) -> Option<&str> {
        self.stack.last().map(|e| e.title.as_str())
    }

    /// Level of the innermost active heading, if any.
    pub fn current_level(&self) -> Option<u8> {
        self.stack.last().map(|e| e.level)
    }

    /// Depth of the active section stack.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Document, DocumentMetadata, Page, TocEntry};

    #[test]
    fn enter_heading_builds_nested_path() {
        let mut tracker = SectionTracker::new();
        tracker.enter_heading(1, "Chapter 1");
        tracker.enter_heading(2, "Section 1.1");
        assert_eq!(tracker.current_path(), vec!["Chapter 1", "Section 1.1"]);
    }

    #[test]
    fn sibling_heading_pops_previous_entry_at_same_level() {
        let mut tracker = SectionTracker::new();
        tracker.enter_heading(1, "Chapter 1");
        tracker.enter_heading(2, "Section 1.1");
        tracker.enter_heading(2, "Section 1.2");
        assert_eq!(tracker.current_path(), vec!["Chapter 1", "Section 1.2"]);
    }

    #[test]
    fn shallower_heading_pops_all_deeper_entries() {
        let mut tracker = SectionTracker::new();
        tracker.enter_heading(1, "Chapter 1");
        tracker.enter_heading(2, "Section 1.1");
        tracker.enter_heading(3, "Sub 1.1.1");
        tracker.enter_heading(1, "Chapter 2");
        assert_eq!(tracker.current_path(), vec!["Chapter 2"]);
        assert_eq!(tracker.depth(), 1);
    }

    #[test]
    fn skipped_heading_levels_nest_by_path_length_not_level_number() {
        let mut tracker = SectionTracker::new();
        tracker.enter_heading(1, "A");
        tracker.enter_heading(5, "B");
        tracker.enter_heading(3, "C");
        assert_eq!(tracker.current_path(), vec!["A", "B", "C"]);
    }

    #[test]
    fn toc_matching_paragraph_acts_like_a_heading() {
        let doc = Document::new(DocumentMetadata::default(), vec![Page::new(1)])
            .with_toc(vec![TocEntry::new("Introduction", 1, 1)]);
        let mut tracker = SectionTracker::new();
        let matched = tracker.maybe_enter_from_toc(&doc, 1, "Introduction");
        assert!(matched);
        assert_eq!(tracker.current_title(), Some("Introduction"));
    }

    #[test]
    fn non_matching_paragraph_does_not_change_path() {
        let doc = Document::new(DocumentMetadata::default(), vec![Page::new(1)]);
        let mut tracker = SectionTracker::new();
        tracker.enter_heading(1, "Chapter 1");
        let matched = tracker.maybe_enter_from_toc(&doc, 1, "Some random text");
        assert!(!matched);
        assert_eq!(tracker.current_path(), vec!["Chapter 1"]);
    }
}
