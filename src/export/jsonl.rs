use std::io::Write;

use super::build_record;
use crate::chunk::Chunk;
use crate::config::ExportConfig;
use crate::error::{ExportError, ExportResult};

/// Write one JSON record per line (UTF-8).
pub fn export_jsonl<W: Write>(chunks: &[Chunk], config: &ExportConfig, mut writer: W) -> ExportResult<()> {
    tracing::debug!(count = chunks.len(), "exporting jsonl");
    for (index, chunk) in chunks.iter().enumerate() {
        let record = build_record(chunk, config);
        let line = if config.pretty_print {
            serde_json::to_string_pretty(&record)
        } else {
            serde_json::to_string(&record)
        }
        .map_err(|e| ExportError::Record {
            index,
            source: Box::new(ExportError::from(e)),
        })?;
        writeln!(writer, "{line}").map_err(|e| ExportError::Record {
            index,
            source: Box::new(ExportError::from(e)),
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{ChunkLevel, ChunkMetadata};

    fn chunk(id: &str, text: &str) -> Chunk {
        let metadata = ChunkMetadata {
            document_title: "Doc".into(),
            section_path: Vec::new(),
            section_title: None,
            heading_level: None,
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
            char_count: text.len(),
            word_count: 1,
            estimated_tokens: 1,
            bbox: None,
        };
        Chunk::new(id, text, metadata)
    }

    #[test]
    fn exports_one_line_per_chunk() {
        let chunks = vec![chunk("chunk-0", "Hello"), chunk("chunk-1", "World")];
        let mut buf = Vec::new();
        export_jsonl(&chunks, &ExportConfig::default(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.lines().next().unwrap().contains("Hello"));
    }
}
