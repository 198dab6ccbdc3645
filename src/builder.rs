// Chunk Builder — walks a Document page by page, element by element,
// accumulates text blocks, and emits Chunks at structural boundaries. See
// spec.md §4.6.

use crate::boundary::{self, BoundaryDetector, ContentBlock};
use crate::chunk::{Chunk, ChunkLevel, ChunkMetadata};
use crate::config::ChunkerConfig;
use crate::list::{self, ListCoherenceAnalyzer, ListConfig};
use crate::model::{Cell, Document, Element, ListItemSource};
use crate::overlap::{self, OverlapConfig, OverlapStrategy};
use crate::section::SectionTracker;
use crate::size::{LimitType, SizeCalculator, SizeConfig, SizeLimit, Unit};
use crate::table::{self, TableConfig};

/// The text block currently being accumulated from consecutive ordinary
/// paragraphs/captions, pending a flush.
struct TextBlock {
    elements: Vec<Element>,
    section_path: Vec<String>,
    section_title: Option<String>,
    page: u32,
}

/// Average characters per sentence, matching the ratio `SizeCalculator`
/// uses to estimate target positions (spec §4.1).
const CHARS_PER_SENTENCE: usize = 80;

/// Maps `ChunkerConfig`'s overlap keys (`overlapSize`/`overlapSentences`,
/// spec §6) onto a full `OverlapConfig`, reusing `includeSectionContext`
/// for the overlap generator's own `includeHeadingContext` flag since
/// spec §6 names no separate chunker-config key for it. `overlapSize` is
/// always a character count; under the sentence strategy it is converted
/// to an approximate sentence count so a chunker configured for "~100
/// characters of overlap" doesn't end up repeating the last 100 sentences.
fn overlap_config_from(config: &ChunkerConfig) -> OverlapConfig {
    let strategy = config.overlap_strategy();
    let size = match strategy {
        OverlapStrategy::Sentence => (config.overlap_size / CHARS_PER_SENTENCE).max(1),
        _ => config.overlap_size,
    };
    OverlapConfig {
        strategy,
        size,
        min_overlap: config.overlap_size,
        include_heading_context: config.include_section_context,
        ..OverlapConfig::default()
    }
}

fn size_config_from(config: &ChunkerConfig) -> SizeConfig {
    SizeConfig {
        target: SizeLimit::new(config.target_chunk_size, Unit::Characters, LimitType::Soft),
        min: SizeLimit::new(config.min_chunk_size, Unit::Characters, LimitType::Soft),
        max: SizeLimit::new(config.max_chunk_size, Unit::Characters, LimitType::Hard),
        tokens_per_char: 0.25,
        allow_exceed_for_atomic_content: true,
        merge_small_chunks: true,
        split_at_semantic_boundaries: true,
    }
}

/// Predecessor-then-successor caption lookup for a table/figure at
/// `index` within its page's element list.
fn adjacent_caption_text<'a>(
    elements: &'a [Element],
    index: usize,
    is_caption: impl Fn(&str) -> bool,
) -> Option<&'a str> {
    let predecessor = index.checked_sub(1).and_then(|i| elements.get(i));
    let successor = elements.get(index + 1);
    for candidate in [predecessor, successor].into_iter().flatten() {
        if let Some(text) = candidate.plain_text() {
            if is_caption(text) {
                return Some(text);
            }
        }
    }
    None
}

fn is_table_or_figure(element: Option<&Element>) -> bool {
    matches!(element, Some(Element::Table { .. }) | Some(Element::Figure { .. }))
}

fn is_figure(element: Option<&Element>) -> bool {
    matches!(element, Some(Element::Figure { .. }))
}

pub struct ChunkBuilder {
    config: ChunkerConfig,
    size_calc: SizeCalculator,
    boundary_detector: BoundaryDetector,
    list_analyzer: ListCoherenceAnalyzer,
    table_config: TableConfig,
    section_tracker: SectionTracker,
    chunks: Vec<Chunk>,
    current_block: Option<TextBlock>,
    next_index: usize,
    table_counter: usize,
    figure_counter: usize,
    document_title: String,
}

impl ChunkBuilder {
    pub fn new(config: ChunkerConfig) -> Self {
        let size_calc = SizeCalculator::new(size_config_from(&config));
        Self {
            config,
            size_calc,
            boundary_detector: BoundaryDetector::new(),
            list_analyzer: ListCoherenceAnalyzer::new(ListConfig::default()),
            table_config: TableConfig::default(),
            section_tracker: SectionTracker::new(),
            chunks: Vec::new(),
            current_block: None,
            next_index: 0,
            table_counter: 0,
            figure_counter: 0,
            document_title: String::new(),
        }
    }

    /// As `new`, but rejects a `minChunkSize > maxChunkSize` configuration
    /// instead of building a chunker that can never treat a block as
    /// within size (spec §7: config validation is the one `InvalidInput`
    /// case modeled as a real error rather than a silent default).
    pub fn try_new(config: ChunkerConfig) -> crate::error::ChunkResult<Self> {
        size_config_from(&config).validate()?;
        Ok(Self::new(config))
    }

    /// Walk `document` and return its emitted chunks, stamped with
    /// `totalChunks`.
    pub fn build(mut self, document: &Document) -> Vec<Chunk> {
        self.document_title = document.metadata.title.clone();
        tracing::info!(
            title = %self.document_title,
            pages = document.pages.len(),
            "building chunks"
        );

        for page in &document.pages {
            let elements = &page.elements;
            for (i, element) in elements.iter().enumerate() {
                match element {
                    Element::Heading { level, text, .. } => {
                        // Minor headings (level > minHeadingLevel) stay inline in the
                        // surrounding content and never enter sectionPath; only headings
                        // at or above the configured level get their own chunk.
                        if self.config.split_on_headings && *level <= self.config.min_heading_level {
                            self.flush();
                            self.section_tracker.enter_heading(*level, text);
                            self.emit_heading_chunk(text, *level, page.number);
                        } else {
                            self.append_element(element.clone(), page.number);
                        }
                    }
                    Element::Paragraph { text, .. } => {
                        if let Some(entry) = document.toc_entry_for(page.number, text) {
                            self.flush();
                            let (level, title) = (entry.level, entry.title.clone());
                            self.section_tracker.enter_heading(level, &title);
                            self.emit_heading_chunk(text, level, page.number);
                        } else {
                            self.append_element(element.clone(), page.number);
                        }
                    }
                    Element::List { ordered, items, .. } => {
                        // A list-intro paragraph must land in the same chunk as the
                        // list it introduces (spec §4.2/§4.6): pull it back out of
                        // the pending block instead of letting a plain flush strand
                        // it as its own chunk first.
                        let intro = self.take_list_intro();
                        if intro.is_none() {
                            self.flush();
                        }
                        self.emit_list_chunk(*ordered, items, page.number, intro);
                    }
                    Element::Table { rows, header_row, .. } => {
                        self.flush();
                        self.emit_table_chunks(rows, *header_row, elements, i, page.number);
                    }
                    Element::Image { alt_text, .. } => {
                        let adjacent_to_figure = is_figure(i.checked_sub(1).and_then(|p| elements.get(p)))
                            || is_figure(elements.get(i + 1));
                        if !adjacent_to_figure && !alt_text.trim().is_empty() {
                            self.flush();
                            self.emit_image_chunk(alt_text, page.number);
                        }
                    }
                    Element::Figure { .. } => {
                        self.flush();
                        self.emit_figure_chunk(elements, i, page.number);
                    }
                    Element::Caption { .. } => {
                        let prev_consumed = is_table_or_figure(i.checked_sub(1).and_then(|p| elements.get(p)));
                        let next_consumed = is_table_or_figure(elements.get(i + 1));
                        if !prev_consumed && !next_consumed {
                            self.append_element(element.clone(), page.number);
                        }
                    }
                }
            }
            self.flush();
        }
        self.flush();

        self.stamp_total_chunks();
        overlap::apply_overlap(&mut self.chunks, &overlap_config_from(&self.config));
        tracing::info!(chunks = self.chunks.len(), "chunk build complete");
        self.chunks
    }

    fn next_id(&mut self) -> String {
        let id = format!("{}-{}", self.config.id_prefix, self.next_index);
        self.next_index += 1;
        id
    }

    fn base_metadata(&self, page: u32, level: ChunkLevel) -> ChunkMetadata {
        ChunkMetadata {
            document_title: self.document_title.clone(),
            section_path: self.section_tracker.current_path(),
            section_title: self.section_tracker.current_title().map(str::to_string),
            heading_level: None,
            page_start: page,
            page_end: page,
            chunk_index: 0,
            total_chunks: 0,
            level,
            parent_id: None,
            child_ids: Vec::new(),
            element_types: Vec::new(),
            has_table: false,
            has_list: false,
            has_image: false,
            char_count: 0,
            word_count: 0,
            estimated_tokens: 0,
            bbox: None,
        }
    }

    fn fill_size_fields(&self, metadata: &mut ChunkMetadata, text: &str) {
        let metrics = self.size_calc.calculate(text);
        metadata.char_count = metrics.characters;
        metadata.word_count = metrics.words;
        metadata.estimated_tokens = metrics.tokens;
    }

    fn append_element(&mut self, element: Element, page: u32) {
        if self.current_block.is_none() {
            self.current_block = Some(TextBlock {
                elements: Vec::new(),
                section_path: self.section_tracker.current_path(),
                section_title: self.section_tracker.current_title().map(str::to_string),
                page,
            });
        }
        if let Some(block) = &mut self.current_block {
            block.elements.push(element);
        }
    }

    fn emit_heading_chunk(&mut self, text: &str, level: u8, page: u32) {
        let id = self.next_id();
        let mut metadata = self.base_metadata(page, ChunkLevel::Section);
        metadata.heading_level = Some(level);
        metadata.record_element("heading");
        self.fill_size_fields(&mut metadata, text);
        self.chunks.push(Chunk::new(id, text.to_string(), metadata));
    }

    /// Trim the current block, run it through the Size Calculator, and
    /// emit one chunk (within max) or several (split to size).
    fn flush(&mut self) {
        let block = match self.current_block.take() {
            Some(block) => block,
            None => return,
        };
        if block.elements.is_empty() {
            return;
        }

        let content_blocks: Vec<ContentBlock> = block.elements.iter().map(|e| ContentBlock { element: e }).collect();
        let (text, boundaries) = self.boundary_detector.detect(&content_blocks);
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return;
        }

        let kinds: Vec<String> = {
            let mut kinds = Vec::new();
            for element in &block.elements {
                let kind = element.kind_name().to_string();
                if !kinds.contains(&kind) {
                    kinds.push(kind);
                }
            }
            kinds
        };

        let pieces = if self.size_calc.is_above_max(trimmed) {
            let pieces = self.size_calc.split_to_size(trimmed, &boundaries);
            tracing::debug!(chars = trimmed.len(), into = pieces.len(), "oversize block split");
            pieces
        } else {
            vec![trimmed.to_string()]
        };

        for piece in pieces {
            let id = self.next_id();
            let mut metadata = ChunkMetadata {
                document_title: self.document_title.clone(),
                section_path: block.section_path.clone(),
                section_title: block.section_title.clone(),
                heading_level: None,
                page_start: block.page,
                page_end: block.page,
                chunk_index: 0,
                total_chunks: 0,
                level: ChunkLevel::Paragraph,
                parent_id: None,
                child_ids: Vec::new(),
                element_types: Vec::new(),
                has_table: false,
                has_list: false,
                has_image: false,
                char_count: 0,
                word_count: 0,
                estimated_tokens: 0,
                bbox: None,
            };
            for kind in &kinds {
                metadata.record_element(kind);
            }
            self.fill_size_fields(&mut metadata, &piece);
            self.chunks.push(Chunk::new(id, piece, metadata));
        }
    }

    /// If the block currently being accumulated ends with a paragraph that
    /// reads as a list intro, pop it out, flush whatever preceded it as its
    /// own chunk, and hand the intro text back so the caller can fold it
    /// into the list chunk about to be emitted.
    fn take_list_intro(&mut self) -> Option<String> {
        let is_intro = matches!(
            self.current_block.as_ref().and_then(|b| b.elements.last()),
            Some(Element::Paragraph { text, .. }) if boundary::is_list_intro(text)
        );
        if !is_intro {
            return None;
        }
        let element = self.current_block.as_mut()?.elements.pop()?;
        let intro_text = match element {
            Element::Paragraph { text, .. } => text,
            _ => unreachable!("checked above"),
        };
        self.flush();
        Some(intro_text)
    }

    fn emit_list_chunk(&mut self, ordered: bool, items: &[ListItemSource], page: u32, intro: Option<String>) {
        let tree = list::tree_from_sources(items);
        let keep_together = self.config.preserve_list_coherence || self.list_analyzer.should_keep_together(&tree);
        let prefix = |text: String| match &intro {
            Some(intro) => format!("{intro}\n\n{text}"),
            None => text,
        };

        if keep_together {
            let formatted = prefix(self.list_analyzer.format(&tree, ordered));
            self.push_list_chunk(formatted, page, false);
            return;
        }

        match self.list_analyzer.split(&tree) {
            Some(split) => {
                let first = prefix(self.list_analyzer.format(&split.first, ordered));
                let second = self.list_analyzer.format(&split.second, ordered);
                self.push_list_chunk(first, page, split.first_is_incomplete);
                self.push_list_chunk(second, page, false);
            }
            None => {
                let formatted = prefix(self.list_analyzer.format(&tree, ordered));
                self.push_list_chunk(formatted, page, false);
            }
        }
    }

    fn push_list_chunk(&mut self, text: String, page: u32, incomplete: bool) {
        let id = self.next_id();
        let mut metadata = self.base_metadata(page, ChunkLevel::Paragraph);
        metadata.has_list = true;
        metadata.record_element("list");
        self.fill_size_fields(&mut metadata, &text);
        let mut chunk = Chunk::new(id, text, metadata);
        chunk.is_incomplete = incomplete;
        self.chunks.push(chunk);
    }

    fn emit_table_chunks(&mut self, rows: &[Vec<Cell>], header_row: Option<usize>, elements: &[Element], index: usize, page: u32) {
        let caption = adjacent_caption_text(elements, index, table::is_table_caption).map(str::to_string);

        let groups = if self.config.preserve_table_coherence {
            vec![rows.to_vec()]
        } else {
            table::split_table(rows, header_row, &self.table_config)
        };
        let total_splits = groups.len();

        for (split_index, group) in groups.into_iter().enumerate() {
            let group_header = if split_index == 0 { header_row } else { Some(0) };
            let rendered = table::render_table(&group, group_header, self.table_config.format);

            let id = format!("table_{page}_{}", self.table_counter);
            self.table_counter += 1;

            let mut metadata = self.base_metadata(page, ChunkLevel::Paragraph);
            metadata.has_table = true;
            metadata.record_element("table");
            if split_index == 0 {
                if let Some(cap) = &caption {
                    metadata.section_title = Some(cap.clone());
                }
            }
            self.fill_size_fields(&mut metadata, &rendered);

            let mut chunk = Chunk::new(id, rendered, metadata);
            chunk.is_incomplete = total_splits > 1 && split_index + 1 < total_splits;
            if total_splits > 1 {
                chunk.is_split = true;
                chunk.split_index = Some(split_index);
                chunk.total_splits = Some(total_splits);
            }
            self.chunks.push(chunk);
        }
    }

    fn emit_image_chunk(&mut self, alt_text: &str, page: u32) {
        let text = format!("[Image: {alt_text}]");
        let id = self.next_id();
        let mut metadata = self.base_metadata(page, ChunkLevel::Paragraph);
        metadata.has_image = true;
        metadata.record_element("image");
        self.fill_size_fields(&mut metadata, &text);
        self.chunks.push(Chunk::new(id, text, metadata));
    }

    fn emit_figure_chunk(&mut self, elements: &[Element], index: usize, page: u32) {
        let caption = adjacent_caption_text(elements, index, table::is_figure_caption);
        let adjacent_image = [index.checked_sub(1), Some(index + 1)]
            .into_iter()
            .flatten()
            .filter_map(|i| elements.get(i))
            .find_map(|e| match e {
                Element::Image { alt_text, format, .. } => Some((alt_text.as_str(), format.as_str())),
                _ => None,
            });
        let (alt_text, format) = match adjacent_image {
            Some((alt, fmt)) => (Some(alt), Some(fmt)),
            None => (None, None),
        };

        let description = match table::describe_figure(caption, alt_text, format) {
            Some(text) => text,
            None => return,
        };

        let id = format!("figure_{page}_{}", self.figure_counter);
        self.figure_counter += 1;

        let mut metadata = self.base_metadata(page, ChunkLevel::Paragraph);
        metadata.has_image = true;
        metadata.record_element("figure");
        metadata.section_title = caption.map(str::to_string);
        self.fill_size_fields(&mut metadata, &description);
        self.chunks.push(Chunk::new(id, description, metadata));
    }

    fn stamp_total_chunks(&mut self) {
        let total = self.chunks.len();
        for (i, chunk) in self.chunks.iter_mut().enumerate() {
            chunk.metadata.chunk_index = i;
            chunk.metadata.total_chunks = total;
            if self.config.include_section_context {
                if let Some(title) = &chunk.metadata.section_title {
                    chunk.text_with_context = Some(format!("[{title}]\n\n{}", chunk.content));
                }
            }
        }
    }
}

/// Convenience entry point: build a chunk sequence for `document` under
/// `config`.
pub fn build_chunks(document: &Document, config: ChunkerConfig) -> Vec<Chunk> {
    ChunkBuilder::new(config).build(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BBox, DocumentMetadata, Page, TocEntry};

    fn doc_with_elements(elements: Vec<Element>) -> Document {
        Document::new(
            DocumentMetadata {
                title: "Doc".into(),
                ..Default::default()
            },
            vec![Page::new(1).with_elements(elements)],
        )
    }

    #[test]
    fn s1_single_paragraph_below_target() {
        let doc = doc_with_elements(vec![Element::Paragraph {
            text: "This is a single paragraph of text.".into(),
            bbox: BBox::ZERO,
        }]);
        let chunks = build_chunks(&doc, ChunkerConfig::default());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "This is a single paragraph of text.");
        assert_eq!(chunks[0].metadata.char_count, 36);
        assert_eq!(chunks[0].metadata.word_count, 8);
        assert_eq!(chunks[0].metadata.estimated_tokens, 9);
        assert_eq!(chunks[0].metadata.level, ChunkLevel::Paragraph);
        assert!(!chunks[0].metadata.has_table);
        assert_eq!(chunks[0].metadata.total_chunks, 1);
    }

    #[test]
    fn s2_headings_establish_section_path() {
        let doc = Document::new(
            DocumentMetadata {
                title: "Doc".into(),
                ..Default::default()
            },
            vec![Page::new(1).with_elements(vec![
                Element::Paragraph {
                    text: "Introduction".into(),
                    bbox: BBox::ZERO,
                },
                Element::Paragraph {
                    text: "Overview text.".into(),
                    bbox: BBox::ZERO,
                },
                Element::Paragraph {
                    text: "Background".into(),
                    bbox: BBox::ZERO,
                },
                Element::Paragraph {
                    text: "Details.".into(),
                    bbox: BBox::ZERO,
                },
            ])],
        )
        .with_toc(vec![
            TocEntry::new("Introduction", 1, 1),
            TocEntry::new("Background", 1, 2),
        ]);

        let config = ChunkerConfig {
            overlap_size: 0,
            ..ChunkerConfig::default()
        };
        let chunks = build_chunks(&doc, config);
        assert_eq!(chunks[0].content, "Introduction");
        assert_eq!(chunks[0].metadata.section_path, vec!["Introduction".to_string()]);

        let overview = chunks.iter().find(|c| c.content == "Overview text.").unwrap();
        assert_eq!(overview.metadata.section_path, vec!["Introduction".to_string()]);

        let details = chunks.iter().find(|c| c.content == "Details.").unwrap();
        assert_eq!(
            details.metadata.section_path,
            vec!["Introduction".to_string(), "Background".to_string()]
        );
    }

    #[test]
    fn s3_oversize_paragraph_is_split_under_max() {
        let text = "Sentence one. ".repeat(30);
        let doc = doc_with_elements(vec![Element::Paragraph {
            text: text.trim().to_string(),
            bbox: BBox::ZERO,
        }]);
        let config = ChunkerConfig {
            max_chunk_size: 100,
            overlap_size: 0,
            ..ChunkerConfig::default()
        };
        let chunks = build_chunks(&doc, config);
        assert!(chunks.len() >= 4);
        for chunk in &chunks {
            assert!(chunk.content.len() <= 100);
        }
    }

    #[test]
    fn s4_list_with_intro_kept_together() {
        let doc = doc_with_elements(vec![
            Element::Paragraph {
                text: "The following features:".into(),
                bbox: BBox::ZERO,
            },
            Element::List {
                ordered: false,
                items: vec![
                    ListItemSource { text: "One".into(), level: 0 },
                    ListItemSource { text: "Two".into(), level: 0 },
                    ListItemSource { text: "Three".into(), level: 0 },
                ],
                bbox: BBox::ZERO,
            },
        ]);
        let chunks = build_chunks(&doc, ChunkerConfig::default());
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].content.contains("The following features:"));
        assert!(chunks[0].content.contains("- One"));
        assert!(chunks[0].content.contains("- Two"));
        assert!(chunks[0].content.contains("- Three"));
        assert!(chunks[0].metadata.has_list);
    }

    #[test]
    fn s5_table_rendered_atomically_in_markdown() {
        let doc = doc_with_elements(vec![Element::Table {
            rows: vec![
                vec![Cell::header("Name"), Cell::header("Age")],
                vec![Cell::new("Alice"), Cell::new("30")],
            ],
            header_row: Some(0),
            bbox: BBox::ZERO,
        }]);
        let chunks = build_chunks(&doc, ChunkerConfig::default());
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].content.contains("| Name | Age |"));
        assert!(chunks[0].content.contains("| Alice | 30 |"));
        assert!(chunks[0].content.contains("---"));
        assert!(chunks[0].metadata.has_table);
    }

    #[test]
    fn oversized_table_splits_are_tagged_with_split_index_and_total() {
        let mut rows = vec![vec![Cell::header("Name")]];
        for i in 0..60 {
            rows.push(vec![Cell::new(format!("Row {i}"))]);
        }
        let doc = doc_with_elements(vec![Element::Table {
            rows,
            header_row: Some(0),
            bbox: BBox::ZERO,
        }]);
        let config = ChunkerConfig {
            preserve_table_coherence: false,
            ..ChunkerConfig::default()
        };
        let chunks = build_chunks(&doc, config);
        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert!(chunk.is_split);
            assert_eq!(chunk.split_index, Some(i));
            assert_eq!(chunk.total_splits, Some(chunks.len()));
        }
        assert!(!chunks.last().unwrap().is_incomplete);
        assert!(chunks[0].is_incomplete);
    }

    #[test]
    fn table_caption_is_attached_as_section_title() {
        let doc = doc_with_elements(vec![
            Element::Caption {
                text: "Table 1: Revenue".into(),
                bbox: BBox::ZERO,
            },
            Element::Table {
                rows: vec![vec![Cell::header("Name")], vec![Cell::new("Alice")]],
                header_row: Some(0),
                bbox: BBox::ZERO,
            },
        ]);
        let chunks = build_chunks(&doc, ChunkerConfig::default());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].metadata.section_title.as_deref(), Some("Table 1: Revenue"));
    }

    #[test]
    fn image_with_empty_alt_text_is_skipped() {
        let doc = doc_with_elements(vec![Element::Image {
            alt_text: "".into(),
            format: "png".into(),
            bbox: BBox::ZERO,
        }]);
        let chunks = build_chunks(&doc, ChunkerConfig::default());
        assert!(chunks.is_empty());
    }

    #[test]
    fn figure_with_adjacent_caption_and_image_combines_description() {
        let doc = doc_with_elements(vec![
            Element::Caption {
                text: "Figure 1: Overview".into(),
                bbox: BBox::ZERO,
            },
            Element::Figure { bbox: BBox::ZERO },
            Element::Image {
                alt_text: "architecture diagram".into(),
                format: "png".into(),
                bbox: BBox::ZERO,
            },
        ]);
        let chunks = build_chunks(&doc, ChunkerConfig::default());
        let figure_chunk = chunks.iter().find(|c| c.metadata.has_image).unwrap();
        assert_eq!(
            figure_chunk.content,
            "Figure 1: Overview - architecture diagram - [PNG image]"
        );
        assert_eq!(figure_chunk.metadata.section_title.as_deref(), Some("Figure 1: Overview"));
    }

    #[test]
    fn include_section_context_prefixes_text_with_context() {
        let doc = doc_with_elements(vec![
            Element::Heading {
                level: 1,
                text: "Introduction".into(),
                bbox: BBox::ZERO,
            },
            Element::Paragraph {
                text: "Body text.".into(),
                bbox: BBox::ZERO,
            },
        ]);
        let config = ChunkerConfig {
            overlap_size: 0,
            ..ChunkerConfig::default()
        };
        let chunks = build_chunks(&doc, config);
        let body = chunks.iter().find(|c| c.content == "Body text.").unwrap();
        assert_eq!(
            body.text_with_context.as_deref(),
            Some("[Introduction]\n\nBody text.")
        );
    }

    #[test]
    fn disabling_section_context_leaves_text_with_context_empty() {
        let doc = doc_with_elements(vec![
            Element::Heading {
                level: 1,
                text: "Introduction".into(),
                bbox: BBox::ZERO,
            },
            Element::Paragraph {
                text: "Body text.".into(),
                bbox: BBox::ZERO,
            },
        ]);
        let config = ChunkerConfig {
            include_section_context: false,
            overlap_size: 0,
            ..ChunkerConfig::default()
        };
        let chunks = build_chunks(&doc, config);
        let body = chunks.iter().find(|c| c.content == "Body text.").unwrap();
        assert!(body.text_with_context.is_none());
    }

    #[test]
    fn default_config_applies_overlap_to_later_chunks() {
        let doc = doc_with_elements(vec![
            Element::Paragraph {
                text: "First paragraph with some real sentence content here.".into(),
                bbox: BBox::ZERO,
            },
            Element::Heading {
                level: 1,
                text: "Next Section".into(),
                bbox: BBox::ZERO,
            },
            Element::Paragraph {
                text: "Second paragraph.".into(),
                bbox: BBox::ZERO,
            },
        ]);
        let chunks = build_chunks(&doc, ChunkerConfig::default());
        assert!(chunks.len() >= 2);
        for chunk in &chunks[1..] {
            assert_eq!(chunk.metadata.char_count, chunk.content.chars().count());
        }
        let last = chunks.last().unwrap();
        assert!(last.content.contains("First paragraph") || last.content.contains("Next Section"));
    }

    #[test]
    fn try_new_rejects_min_chunk_size_exceeding_max() {
        let config = ChunkerConfig {
            min_chunk_size: 5000,
            max_chunk_size: 2000,
            ..ChunkerConfig::default()
        };
        assert!(ChunkBuilder::try_new(config).is_err());
    }

    #[test]
    fn try_new_accepts_default_config() {
        assert!(ChunkBuilder::try_new(ChunkerConfig::default()).is_ok());
    }

    #[test]
    fn chunk_index_and_total_chunks_are_stamped() {
        let doc = doc_with_elements(vec![
            Element::Paragraph {
                text: "First.".into(),
                bbox: BBox::ZERO,
            },
            Element::Heading {
                level: 1,
                text: "Section".into(),
                bbox: BBox::ZERO,
            },
            Element::Paragraph {
                text: "Second.".into(),
                bbox: BBox::ZERO,
            },
        ]);
        let chunks = build_chunks(&doc, ChunkerConfig::default());
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.metadata.chunk_index, i);
            assert_eq!(chunk.metadata.total_chunks, chunks.len());
        }
    }
}
