// Document Model — typed tree the chunker walks: Document -> Page -> Element.
//
// This is the read-only contract an upstream reader (EPUB/HTML/PDF parser,
// never implemented here) must satisfy. Nothing in this module mutates a
// `Document` after construction.

use serde::{Deserialize, Serialize};

/// A fully parsed, structured source document.
///
/// Immutable after construction: every other component in this crate only
/// ever borrows a `Document`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub metadata: DocumentMetadata,
    pub pages: Vec<Page>,
    /// Table of contents, when the source format carries one. Absent TOCs
    /// are common (plain HTML, many PDFs); headings inside pages define
    /// sections in that case.
    pub toc: Vec<TocEntry>,
}

impl Document {
    pub fn new(metadata: DocumentMetadata, pages: Vec<Page>) -> Self {
        Self {
            metadata,
            pages,
            toc: Vec::new(),
        }
    }

    pub fn with_toc(mut self, toc: Vec<TocEntry>) -> Self {
        self.toc = toc;
        self
    }

    /// Total number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Find a TOC entry whose title exactly matches `text`, restricted to a
    /// given page (entries carry the page they start on).
    pub fn toc_entry_for(&self, page: u32, text: &str) -> Option<&TocEntry> {
        self.toc
            .iter()
            .find(|entry| entry.page == page && entry.title == text)
    }
}

/// Document-level metadata. All fields are optional except `title`, which
/// downstream chunk metadata always needs (it is reported verbatim on every
/// emitted chunk).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DocumentMetadata {
    pub title: String,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Vec<String>,
    pub identifier: Option<String>,
    pub language: Option<String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// A single page. 1-indexed, per spec.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub number: u32,
    pub width: f64,
    pub height: f64,
    pub rotation: i32,
    pub elements: Vec<Element>,
    /// Optional flattened side-channel the builder may fall back to when
    /// `elements` is sparse or empty (e.g. an upstream reader that only
    /// bothered to extract plain blocks of text).
    pub layout: Option<Layout>,
}

impl Page {
    pub fn new(number: u32) -> Self {
        Self {
            number,
            width: 612.0,
            height: 792.0,
            rotation: 0,
            elements: Vec::new(),
            layout: None,
        }
    }

    pub fn with_elements(mut self, elements: Vec<Element>) -> Self {
        self.elements = elements;
        self
    }
}

/// Flattened side-channel summary of a page's content, used by the builder
/// only when `Page::elements` is empty.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Layout {
    pub headings: Vec<(u8, String)>,
    pub paragraphs: Vec<String>,
    pub lists: Vec<String>,
}

/// A table cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    pub text: String,
    pub row_span: u32,
    pub col_span: u32,
    pub is_header: bool,
}

impl Cell {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            row_span: 1,
            col_span: 1,
            is_header: false,
        }
    }

    pub fn header(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            row_span: 1,
            col_span: 1,
            is_header: true,
        }
    }
}

/// An item inside a `List` element — raw, pre-parse representation. The
/// List-Coherence Analyzer (`crate::list`) is responsible for turning the
/// raw items into a nested tree; this struct is only the flat carrier the
/// document model hands over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListItemSource {
    pub text: String,
    pub level: u8,
}

/// One node of the document's content tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Element {
    Heading {
        level: u8,
        text: String,
        bbox: BBox,
    },
    Paragraph {
        text: String,
        bbox: BBox,
    },
    List {
        ordered: bool,
        items: Vec<ListItemSource>,
        bbox: BBox,
    },
    Table {
        rows: Vec<Vec<Cell>>,
        header_row: Option<usize>,
        bbox: BBox,
    },
    Image {
        alt_text: String,
        format: String,
        bbox: BBox,
    },
    Figure {
        bbox: BBox,
    },
    Caption {
        text: String,
        bbox: BBox,
    },
}

impl Element {
    pub fn bbox(&self) -> &BBox {
        match self {
            Element::Heading { bbox, .. }
            | Element::Paragraph { bbox, .. }
            | Element::List { bbox, .. }
            | Element::Table { bbox, .. }
            | Element::Image { bbox, .. }
            | Element::Figure { bbox }
            | Element::Caption { bbox, .. } => bbox,
        }
    }

    /// Lowercase, singular element-kind name as used in
    /// `ChunkMetadata::element_types` (spec §3: `{heading, paragraph, list,
    /// table, image, figure, caption}`).
    pub fn kind_name(&self) -> &'static str {
        match self {
            Element::Heading { .. } => "heading",
            Element::Paragraph { .. } => "paragraph",
            Element::List { .. } => "list",
            Element::Table { .. } => "table",
            Element::Image { .. } => "image",
            Element::Figure { .. } => "figure",
            Element::Caption { .. } => "caption",
        }
    }

    /// Best-effort plain text for blocks that are just text (used by the
    /// Boundary Detector to build its flattened content stream).
    pub fn plain_text(&self) -> Option<&str> {
        match self {
            Element::Heading { text, .. } => Some(text),
            Element::Paragraph { text, .. } => Some(text),
            Element::Caption { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// Axis-aligned bounding box in page points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct BBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BBox {
    pub const ZERO: BBox = BBox {
        x: 0.0,
        y: 0.0,
        width: 0.0,
        height: 0.0,
    };

    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Minimum enclosing rectangle of `self` and `other`.
    pub fn merge(&self, other: &BBox) -> BBox {
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = (self.x + self.width).max(other.x + other.width);
        let y1 = (self.y + self.height).max(other.y + other.height);
        BBox {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        }
    }

    fn merge_option(a: Option<BBox>, b: &BBox) -> Option<BBox> {
        Some(match a {
            Some(existing) => existing.merge(b),
            None => *b,
        })
    }

    /// Fold a sequence of bboxes into their merged enclosing rectangle.
    pub fn merge_all<'a>(boxes: impl IntoIterator<Item = &'a BBox>) -> Option<BBox> {
        boxes
            .into_iter()
            .fold(None, |acc, bbox| BBox::merge_option(acc, bbox))
    }
}

/// One entry in a document's table of contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TocEntry {
    pub title: String,
    pub page: u32,
    pub level: u8,
}

impl TocEntry {
    pub fn new(title: impl Into<String>, page: u32, level: u8) -> Self {
        Self {
            title: title.into(),
            page,
            level: level.max(1),
        }
    }
}
