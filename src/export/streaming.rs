use std::io::Write;

use super::build_record;
use crate::chunk::Chunk;
use crate::config::{ExportConfig, ExportFormat};
use crate::error::{ExportError, ExportResult};

/// Writes one JSONL record per `write_chunk` call. Rejects every other
/// format synchronously at construction — streaming CSV/TSV cannot know
/// its metadata columns until every chunk has been seen, so those go
/// through the batch exporter instead.
pub struct StreamingExporter<'a, W: Write> {
    writer: W,
    config: &'a ExportConfig,
}

impl<'a, W: Write> StreamingExporter<'a, W> {
    pub fn new(writer: W, config: &'a ExportConfig) -> ExportResult<Self> {
        match config.format {
            ExportFormat::Jsonl => Ok(Self { writer, config }),
            other => {
                tracing::warn!(format = ?other, "streaming export rejected unsupported format");
                Err(ExportError::UnsupportedFormat(other))
            }
        }
    }

    pub fn write_chunk(&mut self, chunk: &Chunk) -> ExportResult<()> {
        let record = build_record(chunk, self.config);
        let line = serde_json::to_string(&record)?;
        writeln!(self.writer, "{line}")?;
        Ok(())
    }

    pub fn finish(mut self) -> ExportResult<()> {
        self.writer.flush()?;
        tracing::debug!("streaming export finished");
        Ok(())
    }
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
    fn rejects_csv_format_at_construction() {
        let config = ExportConfig {
            format: ExportFormat::Csv,
            ..ExportConfig::default()
        };
        let mut buf = Vec::new();
        let result = StreamingExporter::new(&mut buf, &config);
        assert!(matches!(result, Err(ExportError::UnsupportedFormat(_))));
    }

    #[test]
    fn writes_one_line_per_call() {
        let config = ExportConfig::default();
        let mut buf = Vec::new();
        {
            let mut exporter = StreamingExporter::new(&mut buf, &config).unwrap();
            exporter.write_chunk(&chunk("chunk-0", "Hello")).unwrap();
            exporter.write_chunk(&chunk("chunk-1", "World")).unwrap();
            exporter.finish().unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 2);
    }
}
