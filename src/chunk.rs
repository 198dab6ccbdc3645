// Chunk and ChunkMetadata — the unit of output the builder assembles and
// the overlap/export stages consume. See spec.md §3.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::BBox;

/// The structural granularity a chunk was produced at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkLevel {
    Document,
    Section,
    Paragraph,
    Sentence,
}

/// Everything about a chunk's position and composition beyond its raw
/// text, carried alongside every `Chunk`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub document_title: String,
    pub section_path: Vec<String>,
    pub section_title: Option<String>,
    pub heading_level: Option<u8>,
    pub page_start: u32,
    pub page_end: u32,
    pub chunk_index: usize,
    pub total_chunks: usize,
    pub level: ChunkLevel,
    pub parent_id: Option<String>,
    pub child_ids: Vec<String>,
    pub element_types: Vec<String>,
    pub has_table: bool,
    pub has_list: bool,
    pub has_image: bool,
    pub char_count: usize,
    pub word_count: usize,
    pub estimated_tokens: usize,
    pub bbox: Option<BBox>,
}

impl ChunkMetadata {
    pub fn record_element(&mut self, kind: &str) {
        if !self.element_types.iter().any(|e| e == kind) {
            self.element_types.push(kind.to_string());
        }
        match kind {
            "table" => self.has_table = true,
            "list" => self.has_list = true,
            "image" | "figure" => self.has_image = true,
            _ => {}
        }
    }
}

/// One emitted chunk: text plus everything needed to place, rank, and
/// re-assemble it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub content: String,
    /// `text` prefixed with `"[sectionTitle]\n\n"`, when the builder's
    /// `includeSectionContext` config is on and a section title is active
    /// (spec §3/§6). `None` otherwise.
    pub text_with_context: Option<String>,
    pub metadata: ChunkMetadata,
    /// Whether this chunk is a continuation fragment of a split list
    /// (spec §4.3: first fragment of an incomplete split is flagged).
    pub is_incomplete: bool,
    /// Whether this chunk is one slice of an oversized table split into
    /// multiple row-range chunks (spec §4.5: `{isSplit, splitIndex,
    /// totalSplits}`). `None`/absent for every non-table chunk and for
    /// tables that fit in a single slice.
    pub is_split: bool,
    pub split_index: Option<usize>,
    pub total_splits: Option<usize>,
    /// Embedding vector supplied by the caller. Never computed here (the
    /// chunking engine carries vectors, it does not produce them).
    pub embedding: Option<Vec<f32>>,
}

impl Chunk {
    pub fn new(id: impl Into<String>, content: impl Into<String>, metadata: ChunkMetadata) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            text_with_context: None,
            metadata,
            is_incomplete: false,
            is_split: false,
            split_index: None,
            total_splits: None,
            embedding: None,
        }
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Content hash for dedup/caching, independent of id or position.
    pub fn content_hash(&self) -> String {
        blake3::hash(self.content.as_bytes()).to_hex().to_string()
    }

    /// Generate a fresh random id for a chunk not yet placed in a
    /// sequence (used by exporters producing synthetic records, e.g.
    /// overlap padding).
    pub fn generate_id() -> String {
        Uuid::new_v4().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> ChunkMetadata {
        ChunkMetadata {
            document_title: "Doc".into(),
            section_path: vec!["Intro".into()],
            section_title: Some("Intro".into()),
            heading_level: Some(1),
            page_start: 1,
            page_end: 1,
            chunk_index: 0,
            total_chunks: 1,
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
        }
    }

    #[test]
    fn record_element_sets_has_flags_once() {
        let mut meta = metadata();
        meta.record_element("table");
        meta.record_element("table");
        assert!(meta.has_table);
        assert_eq!(meta.element_types, vec!["table"]);
    }

    #[test]
    fn content_hash_is_stable_for_same_text() {
        let chunk_a = Chunk::new("chunk-0", "hello world", metadata());
        let chunk_b = Chunk::new("chunk-1", "hello world", metadata());
        assert_eq!(chunk_a.content_hash(), chunk_b.content_hash());
    }

    #[test]
    fn content_hash_differs_for_different_text() {
        let chunk_a = Chunk::new("chunk-0", "hello world", metadata());
        let chunk_b = Chunk::new("chunk-1", "goodbye world", metadata());
        assert_ne!(chunk_a.content_hash(), chunk_b.content_hash());
    }
}
