// Chunker and export configuration, serde-deserializable with defaults
// matching spec.md §6.

use serde::{Deserialize, Serialize};

use crate::overlap::OverlapStrategy;

/// Recognised keys for configuring the Chunk Builder pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkerConfig {
    pub target_chunk_size: usize,
    pub max_chunk_size: usize,
    pub min_chunk_size: usize,
    pub overlap_size: usize,
    pub overlap_sentences: bool,
    pub preserve_list_coherence: bool,
    pub preserve_table_coherence: bool,
    pub keep_figures_intact: bool,
    pub include_section_context: bool,
    pub split_on_headings: bool,
    pub min_heading_level: u8,
    pub preserve_paragraphs: bool,
    pub id_prefix: String,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            target_chunk_size: 1000,
            max_chunk_size: 2000,
            min_chunk_size: 100,
            overlap_size: 100,
            overlap_sentences: true,
            preserve_list_coherence: true,
            preserve_table_coherence: true,
            keep_figures_intact: true,
            include_section_context: true,
            split_on_headings: true,
            min_heading_level: 3,
            preserve_paragraphs: true,
            id_prefix: "chunk".to_string(),
        }
    }
}

impl ChunkerConfig {
    /// The overlap strategy implied by `overlap_size`/`overlap_sentences`:
    /// no overlap when size is zero, sentence strategy when requested,
    /// character strategy otherwise.
    pub fn overlap_strategy(&self) -> OverlapStrategy {
        if self.overlap_size == 0 {
            OverlapStrategy::None
        } else if self.overlap_sentences {
            OverlapStrategy::Sentence
        } else {
            OverlapStrategy::Character
        }
    }
}

/// Output serialization format recognised by the exporters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Jsonl,
    Json,
    Csv,
    Tsv,
}

impl ExportFormat {
    /// Conventional output file extension.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Jsonl => "jsonl",
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Tsv => "tsv",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub format: ExportFormat,
    pub include_metadata: bool,
    /// Restrict emitted metadata to these keys; `None` means all keys.
    pub metadata_fields: Option<Vec<String>>,
    pub include_text: bool,
    pub include_embeddings: bool,
    pub flatten_metadata: bool,
    pub csv_delimiter: u8,
    pub include_header: bool,
    pub pretty_print: bool,
    pub text_column_name: String,
    pub chunk_id_column_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: ExportFormat::Jsonl,
            include_metadata: true,
            metadata_fields: None,
            include_text: true,
            include_embeddings: false,
            flatten_metadata: true,
            csv_delimiter: b',',
            include_header: true,
            pretty_print: false,
            text_column_name: "text".to_string(),
            chunk_id_column_name: "id".to_string(),
        }
    }
}

impl ExportConfig {
    pub fn tsv() -> Self {
        Self {
            format: ExportFormat::Tsv,
            csv_delimiter: b'\t',
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunker_config_defaults_match_spec_values() {
        let config = ChunkerConfig::default();
        assert_eq!(config.target_chunk_size, 1000);
        assert_eq!(config.max_chunk_size, 2000);
        assert_eq!(config.min_chunk_size, 100);
        assert_eq!(config.min_heading_level, 3);
        assert_eq!(config.id_prefix, "chunk");
    }

    #[test]
    fn overlap_strategy_follows_size_and_sentence_flag() {
        let mut config = ChunkerConfig::default();
        assert_eq!(config.overlap_strategy(), OverlapStrategy::Sentence);
        config.overlap_sentences = false;
        assert_eq!(config.overlap_strategy(), OverlapStrategy::Character);
        config.overlap_size = 0;
        assert_eq!(config.overlap_strategy(), OverlapStrategy::None);
    }

    #[test]
    fn export_format_extension_matches_spec() {
        assert_eq!(ExportFormat::Jsonl.extension(), "jsonl");
        assert_eq!(ExportFormat::Tsv.extension(), "tsv");
    }

    #[test]
    fn export_config_tsv_preset_uses_tab_delimiter() {
        let config = ExportConfig::tsv();
        assert_eq!(config.csv_delimiter, b'\t');
        assert_eq!(config.format, ExportFormat::Tsv);
    }

    #[test]
    fn deserializing_partial_json_fills_defaults() {
        let config: ChunkerConfig = serde_json::from_str(r#"{"target_chunk_size": 1500}"#).unwrap();
        assert_eq!(config.target_chunk_size, 1500);
        assert_eq!(config.max_chunk_size, 2000);
    }
}
