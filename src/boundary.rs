// Boundary Detector — classifies candidate split points in a sequence of
// content blocks with a type and an integer score (higher = better place to
// split). See spec.md §4.2.

use once_cell::sync::Lazy;
use regex::RegexSet;
use serde::{Deserialize, Serialize};

use crate::model::Element;
use crate::size::is_sentence_terminator_at;

/// A candidate split point's classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundaryType {
    Heading,
    PageBreak,
    Table,
    Figure,
    List,
    CodeBlock,
    Paragraph,
    ListItem,
    Sentence,
    None,
}

impl BoundaryType {
    /// Fixed score table from spec §4.2.
    pub fn score(self) -> i32 {
        match self {
            BoundaryType::Heading => 100,
            BoundaryType::PageBreak => 90,
            BoundaryType::Table => 85,
            BoundaryType::Figure => 85,
            BoundaryType::List => 80,
            BoundaryType::CodeBlock => 80,
            BoundaryType::Paragraph => 70,
            BoundaryType::ListItem => 30,
            BoundaryType::Sentence => 20,
            BoundaryType::None => 0,
        }
    }
}

/// A candidate split point: a character offset into the concatenation of
/// block texts (joined with `"\n\n"`), its type, and its score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Boundary {
    pub position: usize,
    pub boundary_type: BoundaryType,
    pub score: i32,
}

impl Boundary {
    pub fn new(position: usize, boundary_type: BoundaryType) -> Self {
        Self {
            position,
            boundary_type,
            score: boundary_type.score(),
        }
    }
}

/// A span of content that must not be split: tables, intro-attached lists,
/// and caption-adjacent figures.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AtomicSpan {
    pub start: usize,
    pub end: usize,
}

static LIST_INTRO_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)(the following|here are|these (are|include)|below (are|is)|as follows)\s*:\s*$",
        r"(?i)\b(steps|features|items|points|reasons|benefits|advantages|disadvantages|options|examples|requirements|prerequisites|instructions|guidelines|rules|conditions|criteria|objectives|goals|tasks|actions|methods|approaches|techniques|strategies|tips|recommendations|suggestions|notes|warnings|cautions|considerations)\s*:?\s*$",
        r"(?i)\b(include|includes|including|consist of|such as|for example|e\.g\.|i\.e\.)\s*$",
        r"(?i)\b(you (can|should|must|need to|will)|we (can|should|must|will)|to do this)\s*$",
        r"\w\s*:\s*$",
    ])
    .unwrap()
});

/// Whether a trimmed paragraph is a list intro (spec §4.2/§4.4/GLOSSARY).
pub fn is_list_intro(paragraph_text: &str) -> bool {
    let trimmed = paragraph_text.trim();
    !trimmed.is_empty() && LIST_INTRO_PATTERNS.is_match(trimmed)
}

/// A single content block handed to the detector: text plus what kind of
/// element produced it. `bbox`/page data is tracked by the caller; the
/// detector only needs the element-kind classification and text.
#[derive(Debug, Clone)]
pub struct ContentBlock<'a> {
    pub element: &'a Element,
}

/// Stateless detector; holds no per-call data beyond its immutable regex
/// constants (process-wide, see `LIST_INTRO_PATTERNS`).
#[derive(Debug, Clone, Default)]
pub struct BoundaryDetector;

impl BoundaryDetector {
    pub fn new() -> Self {
        Self
    }

    /// Walk a sequence of elements and produce (a) pre-boundaries before
    /// headings, (b) internal sentence boundaries inside paragraphs, (c)
    /// post-boundaries keyed on block type, honoring list-intro
    /// suppression. Returns boundaries plus the concatenated text they are
    /// positioned against.
    pub fn detect(&self, blocks: &[ContentBlock]) -> (String, Vec<Boundary>) {
        let mut text = String::new();
        let mut boundaries = Vec::new();
        let mut offsets = Vec::with_capacity(blocks.len());

        for (i, block) in blocks.iter().enumerate() {
            if i > 0 {
                text.push_str("\n\n");
            }
            offsets.push(text.len());
            if let Some(block_text) = block.element.plain_text() {
                text.push_str(block_text);
            }
        }
        // sentinel end offset
        offsets.push(text.len());

        for (i, block) in blocks.iter().enumerate() {
            let start = offsets[i];
            let end = offsets[i + 1];

            // (a) pre-boundary before headings (not the first block).
            if i > 0 {
                if let Element::Heading { .. } = block.element {
                    boundaries.push(Boundary::new(start, BoundaryType::Heading));
                }
            }

            match block.element {
                Element::Paragraph { text: ptext, .. } => {
                    // (b) internal sentence boundaries.
                    for offset in sentence_offsets(ptext) {
                        boundaries.push(Boundary::new(start + offset, BoundaryType::Sentence));
                    }

                    // (c) post-boundary, suppressed when this paragraph is a
                    // list intro immediately followed by a list.
                    let followed_by_list = blocks
                        .get(i + 1)
                        .map(|b| matches!(b.element, Element::List { .. }))
                        .unwrap_or(false);
                    if !(followed_by_list && is_list_intro(ptext)) {
                        boundaries.push(Boundary::new(end, BoundaryType::Paragraph));
                    }
                }
                Element::List { items, .. } => {
                    // Discouraged internal boundaries between list items.
                    for idx in 1..items.len() {
                        // Evenly space item boundaries across the block's
                        // span as an approximation (the analyzer in
                        // `crate::list` computes the real formatted text).
                        let frac = idx as f64 / items.len() as f64;
                        let pos = start + ((end - start) as f64 * frac) as usize;
                        boundaries.push(Boundary::new(pos, BoundaryType::ListItem));
                    }
                    boundaries.push(Boundary::new(end, BoundaryType::List));
                }
                Element::Table { .. } => {
                    boundaries.push(Boundary::new(end, BoundaryType::Table));
                }
                Element::Figure { .. } => {
                    boundaries.push(Boundary::new(end, BoundaryType::Figure));
                }
                _ => {}
            }
        }

        (text, boundaries)
    }

    /// Atomic spans: tables (always), intro+list pairs, and figure+caption
    /// pairs (either side).
    pub fn atomic_spans(&self, blocks: &[ContentBlock]) -> Vec<AtomicSpan> {
        let mut spans = Vec::new();
        let mut offsets = Vec::with_capacity(blocks.len() + 1);
        let mut pos = 0usize;
        for (i, block) in blocks.iter().enumerate() {
            if i > 0 {
                pos += 2; // "\n\n"
            }
            offsets.push(pos);
            pos += block.element.plain_text().map(str::len).unwrap_or(0);
        }
        offsets.push(pos);

        for (i, block) in blocks.iter().enumerate() {
            match block.element {
                Element::Table { .. } => {
                    spans.push(AtomicSpan {
                        start: offsets[i],
                        end: offsets[i + 1],
                    });
                }
                Element::Paragraph { text, .. } => {
                    if is_list_intro(text) {
                        if let Some(Element::List { .. }) = blocks.get(i + 1).map(|b| b.element) {
                            let end_idx = (i + 2).min(offsets.len() - 1);
                            spans.push(AtomicSpan {
                                start: offsets[i],
                                end: offsets[end_idx],
                            });
                        }
                    }
                }
                Element::Figure { .. } => {
                    let prev_is_caption = i > 0
                        && matches!(blocks[i - 1].element, Element::Caption { .. });
                    let next_is_caption =
                        matches!(blocks.get(i + 1).map(|b| b.element), Some(Element::Caption { .. }));
                    if prev_is_caption {
                        spans.push(AtomicSpan {
                            start: offsets[i - 1],
                            end: offsets[i + 1],
                        });
                    } else if next_is_caption {
                        let end_idx = (i + 2).min(offsets.len() - 1);
                        spans.push(AtomicSpan {
                            start: offsets[i],
                            end: offsets[end_idx],
                        });
                    }
                }
                _ => {}
            }
        }
        spans
    }

    /// Highest-scoring boundary within `[target - window, target + window]`;
    /// ties broken by proximity to `target`.
    pub fn best_boundary<'a>(
        &self,
        boundaries: &'a [Boundary],
        target: usize,
        window: usize,
    ) -> Option<&'a Boundary> {
        let low = target.saturating_sub(window);
        let high = target + window;
        boundaries
            .iter()
            .filter(|b| b.position >= low && b.position <= high)
            .max_by(|a, b| {
                a.score.cmp(&b.score).then_with(|| {
                    let da = (a.position as i64 - target as i64).unsigned_abs();
                    let db = (b.position as i64 - target as i64).unsigned_abs();
                    db.cmp(&da)
                })
            })
    }

    /// A split point creates an orphan if either side, trimmed, is
    /// non-empty but shorter than `min_orphan`. Returns the nearest
    /// non-orphan boundary within `±min_orphan`, else the original
    /// position.
    pub fn adjust_for_orphans(
        &self,
        text: &str,
        position: usize,
        boundaries: &[Boundary],
        min_orphan: usize,
    ) -> usize {
        if !creates_orphan(text, position, min_orphan) {
            return position;
        }

        let low = position.saturating_sub(min_orphan);
        let high = (position + min_orphan).min(text.len());

        boundaries
            .iter()
            .filter(|b| b.position >= low && b.position <= high)
            .filter(|b| !creates_orphan(text, b.position, min_orphan))
            .min_by_key(|b| (b.position as i64 - position as i64).unsigned_abs())
            .map(|b| b.position)
            .unwrap_or(position)
    }
}

fn creates_orphan(text: &str, position: usize, min_orphan: usize) -> bool {
    let position = position.min(text.len());
    let left = text[..position].trim();
    let right = text[position..].trim();
    (!left.is_empty() && left.len() < min_orphan) || (!right.is_empty() && right.len() < min_orphan)
}

/// Character offsets (relative to `text`) right after each sentence
/// terminator, for use as internal boundaries. Delegates the terminator
/// rule to `size::is_sentence_terminator_at` so both modules agree on what
/// counts as a sentence end.
fn sentence_offsets(text: &str) -> Vec<usize> {
    (0..text.len())
        .filter(|&i| is_sentence_terminator_at(text, i))
        .map(|i| i + 1)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BBox;

    fn paragraph(text: &str) -> Element {
        Element::Paragraph {
            text: text.to_string(),
            bbox: BBox::ZERO,
        }
    }

    fn heading(level: u8, text: &str) -> Element {
        Element::Heading {
            level,
            text: text.to_string(),
            bbox: BBox::ZERO,
        }
    }

    #[test]
    fn boundary_type_scores_match_spec_table() {
        assert_eq!(BoundaryType::Heading.score(), 100);
        assert_eq!(BoundaryType::PageBreak.score(), 90);
        assert_eq!(BoundaryType::Table.score(), 85);
        assert_eq!(BoundaryType::Figure.score(), 85);
        assert_eq!(BoundaryType::List.score(), 80);
        assert_eq!(BoundaryType::CodeBlock.score(), 80);
        assert_eq!(BoundaryType::Paragraph.score(), 70);
        assert_eq!(BoundaryType::ListItem.score(), 30);
        assert_eq!(BoundaryType::Sentence.score(), 20);
        assert_eq!(BoundaryType::None.score(), 0);
    }

    #[test]
    fn list_intro_patterns_match_expected_phrasing() {
        assert!(is_list_intro("The following features:"));
        assert!(is_list_intro("Here are the steps"));
        assert!(is_list_intro("This setup requires:"));
        assert!(!is_list_intro("This is just a normal sentence."));
    }

    #[test]
    fn heading_yields_pre_boundary_when_not_first_block() {
        let elements = vec![paragraph("intro"), heading(1, "Section")];
        let blocks: Vec<ContentBlock> = elements.iter().map(|e| ContentBlock { element: e }).collect();
        let detector = BoundaryDetector::new();
        let (_, boundaries) = detector.detect(&blocks);
        assert!(boundaries
            .iter()
            .any(|b| b.boundary_type == BoundaryType::Heading));
    }

    #[test]
    fn list_intro_suppresses_post_paragraph_boundary() {
        let elements = vec![
            paragraph("The following features:"),
            Element::List {
                ordered: false,
                items: vec![
                    crate::model::ListItemSource {
                        text: "One".into(),
                        level: 0,
                    },
                    crate::model::ListItemSource {
                        text: "Two".into(),
                        level: 0,
                    },
                ],
                bbox: BBox::ZERO,
            },
        ];
        let blocks: Vec<ContentBlock> = elements.iter().map(|e| ContentBlock { element: e }).collect();
        let detector = BoundaryDetector::new();
        let (_, boundaries) = detector.detect(&blocks);
        // The intro paragraph should not emit a Paragraph-type post-boundary.
        assert!(!boundaries
            .iter()
            .any(|b| b.boundary_type == BoundaryType::Paragraph));
    }

    #[test]
    fn best_boundary_picks_highest_score_in_window() {
        let boundaries = vec![
            Boundary::new(40, BoundaryType::Sentence),
            Boundary::new(50, BoundaryType::Paragraph),
            Boundary::new(60, BoundaryType::Heading),
        ];
        let detector = BoundaryDetector::new();
        let best = detector.best_boundary(&boundaries, 50, 20).unwrap();
        assert_eq!(best.boundary_type, BoundaryType::Heading);
    }

    #[test]
    fn orphan_adjustment_finds_nearby_non_orphan_boundary() {
        let text = "AB. Full sentence content here that is long enough to not be an orphan.";
        let boundaries = vec![Boundary::new(3, BoundaryType::Sentence), Boundary::new(40, BoundaryType::Paragraph)];
        let detector = BoundaryDetector::new();
        let adjusted = detector.adjust_for_orphans(text, 3, &boundaries, 10);
        // position 3 creates a 3-char left orphan ("AB."); should look elsewhere.
        assert_ne!(adjusted, 3);
    }
}
