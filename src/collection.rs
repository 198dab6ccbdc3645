// Chunk Collection — filter/search/statistics over a produced sequence of
// chunks. Filters return new immutable views without mutating the
// underlying chunks. See spec.md §4.8.

use serde::{Deserialize, Serialize};

use crate::chunk::Chunk;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionStatistics {
    pub total_chunks: usize,
    pub total_tokens: usize,
    pub total_words: usize,
    pub min_tokens: usize,
    pub max_tokens: usize,
    pub avg_tokens: f64,
    pub chunks_with_tables: usize,
    pub chunks_with_lists: usize,
    pub chunks_with_images: usize,
    pub unique_section_count: usize,
    pub page_range: Option<(u32, u32)>,
}

/// An ordered, possibly-filtered view over a shared set of chunks.
#[derive(Debug, Clone)]
pub struct ChunkCollection {
    chunks: Vec<Chunk>,
}

impl ChunkCollection {
    pub fn new(chunks: Vec<Chunk>) -> Self {
        Self { chunks }
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn into_chunks(self) -> Vec<Chunk> {
        self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    fn filtered(&self, predicate: impl Fn(&Chunk) -> bool) -> ChunkCollection {
        ChunkCollection::new(self.chunks.iter().filter(|c| predicate(c)).cloned().collect())
    }

    /// Matches `sectionTitle == title` or `title` present in `sectionPath`.
    pub fn by_section(&self, title: &str) -> ChunkCollection {
        self.filtered(|c| {
            c.metadata.section_title.as_deref() == Some(title)
                || c.metadata.section_path.iter().any(|p| p == title)
        })
    }

    /// `p` between `pageStart` and `pageEnd` inclusive.
    pub fn by_page(&self, page: u32) -> ChunkCollection {
        self.filtered(|c| c.metadata.page_start <= page && page <= c.metadata.page_end)
    }

    /// Any overlap between `[start, end]` and `[pageStart, pageEnd]`.
    pub fn by_page_range(&self, start: u32, end: u32) -> ChunkCollection {
        self.filtered(|c| c.metadata.page_start <= end && start <= c.metadata.page_end)
    }

    /// Case-insensitive containment of `kind` in `elementTypes`.
    pub fn by_element_type(&self, kind: &str) -> ChunkCollection {
        let kind = kind.to_lowercase();
        self.filtered(|c| c.metadata.element_types.iter().any(|t| t.to_lowercase() == kind))
    }

    pub fn with_tables(&self) -> ChunkCollection {
        self.filtered(|c| c.metadata.has_table)
    }

    pub fn with_lists(&self) -> ChunkCollection {
        self.filtered(|c| c.metadata.has_list)
    }

    pub fn with_images(&self) -> ChunkCollection {
        self.filtered(|c| c.metadata.has_image)
    }

    pub fn by_min_tokens(&self, n: usize) -> ChunkCollection {
        self.filtered(|c| c.metadata.estimated_tokens >= n)
    }

    pub fn by_max_tokens(&self, n: usize) -> ChunkCollection {
        self.filtered(|c| c.metadata.estimated_tokens <= n)
    }

    /// Case-insensitive substring match on `text` only.
    pub fn search(&self, keyword: &str) -> ChunkCollection {
        let keyword = keyword.to_lowercase();
        self.filtered(|c| c.content.to_lowercase().contains(&keyword))
    }

    /// Unique section titles, preserving first-seen order.
    pub fn all_sections(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for chunk in &self.chunks {
            if let Some(title) = &chunk.metadata.section_title {
                if !seen.contains(title) {
                    seen.push(title.clone());
                }
            }
        }
        seen
    }

    /// Minimum `pageStart` and maximum `pageEnd` across all chunks.
    pub fn page_range(&self) -> Option<(u32, u32)> {
        let min = self.chunks.iter().map(|c| c.metadata.page_start).min()?;
        let max = self.chunks.iter().map(|c| c.metadata.page_end).max()?;
        Some((min, max))
    }

    pub fn total_tokens(&self) -> usize {
        self.chunks.iter().map(|c| c.metadata.estimated_tokens).sum()
    }

    pub fn total_words(&self) -> usize {
        self.chunks.iter().map(|c| c.metadata.word_count).sum()
    }

    pub fn statistics(&self) -> CollectionStatistics {
        let token_counts: Vec<usize> = self.chunks.iter().map(|c| c.metadata.estimated_tokens).collect();
        let total_tokens: usize = token_counts.iter().sum();
        let min_tokens = token_counts.iter().copied().min().unwrap_or(0);
        let max_tokens = token_counts.iter().copied().max().unwrap_or(0);
        let avg_tokens = if self.chunks.is_empty() {
            0.0
        } else {
            total_tokens as f64 / self.chunks.len() as f64
        };

        CollectionStatistics {
            total_chunks: self.chunks.len(),
            total_tokens,
            total_words: self.total_words(),
            min_tokens,
            max_tokens,
            avg_tokens,
            chunks_with_tables: self.chunks.iter().filter(|c| c.metadata.has_table).count(),
            chunks_with_lists: self.chunks.iter().filter(|c| c.metadata.has_list).count(),
            chunks_with_images: self.chunks.iter().filter(|c| c.metadata.has_image).count(),
            unique_section_count: self.all_sections().len(),
            page_range: self.page_range(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{ChunkLevel, ChunkMetadata};

    fn chunk(id: &str, text: &str, section_title: Option<&str>, page: u32, tokens: usize) -> Chunk {
        let metadata = ChunkMetadata {
            document_title: "Doc".into(),
            section_path: section_title.map(|s| vec![s.to_string()]).unwrap_or_default(),
            section_title: section_title.map(|s| s.to_string()),
            heading_level: None,
            page_start: page,
            page_end: page,
            chunk_index: 0,
            total_chunks: 1,
            level: ChunkLevel::Paragraph,
            parent_id: None,
            child_ids: Vec::new(),
            element_types: Vec::new(),
            has_table: false,
            has_list: false,
            has_image: false,
            char_count: text.len(),
            word_count: 0,
            estimated_tokens: tokens,
            bbox: None,
        };
        Chunk::new(id, text, metadata)
    }

    #[test]
    fn by_page_filters_to_overlapping_pages() {
        let collection = ChunkCollection::new(vec![
            chunk("chunk-0", "a", None, 1, 10),
            chunk("chunk-1", "b", None, 2, 10),
        ]);
        let filtered = collection.by_page(2);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.chunks()[0].id, "chunk-1");
    }

    #[test]
    fn search_is_case_insensitive() {
        let collection = ChunkCollection::new(vec![chunk("chunk-0", "Hello World", None, 1, 10)]);
        assert_eq!(collection.search("hello").len(), 1);
        assert_eq!(collection.search("xyz").len(), 0);
    }

    #[test]
    fn filter_laws_compose_as_conjunction() {
        let collection = ChunkCollection::new(vec![
            chunk("chunk-0", "alpha", None, 1, 5),
            chunk("chunk-1", "beta", None, 1, 50),
            chunk("chunk-2", "gamma", None, 2, 50),
        ]);
        let chained = collection.by_page(1).by_min_tokens(10);
        let combined = collection.filtered(|c| c.metadata.page_start <= 1 && 1 <= c.metadata.page_end && c.metadata.estimated_tokens >= 10);
        let chained_ids: Vec<&str> = chained.chunks().iter().map(|c| c.id.as_str()).collect();
        let combined_ids: Vec<&str> = combined.chunks().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(chained_ids, combined_ids);
    }

    #[test]
    fn all_sections_preserves_first_seen_order_and_dedupes() {
        let collection = ChunkCollection::new(vec![
            chunk("chunk-0", "a", Some("Intro"), 1, 10),
            chunk("chunk-1", "b", Some("Background"), 1, 10),
            chunk("chunk-2", "c", Some("Intro"), 2, 10),
        ]);
        assert_eq!(collection.all_sections(), vec!["Intro", "Background"]);
    }

    #[test]
    fn statistics_reports_totals_and_range() {
        let collection = ChunkCollection::new(vec![
            chunk("chunk-0", "a", None, 1, 10),
            chunk("chunk-1", "b", None, 3, 20),
        ]);
        let stats = collection.statistics();
        assert_eq!(stats.total_chunks, 2);
        assert_eq!(stats.total_tokens, 30);
        assert_eq!(stats.avg_tokens, 15.0);
        assert_eq!(stats.page_range, Some((1, 3)));
    }
}
