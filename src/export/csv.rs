use std::collections::BTreeSet;
use std::io::Write;

use csv::WriterBuilder;
use serde_json::Value;

use super::build_record;
use crate::chunk::Chunk;
use crate::config::ExportConfig;
use crate::error::{ExportError, ExportResult};

/// Write chunks as CSV (or TSV, via `config.csv_delimiter`). Fixed
/// standard columns first, then metadata keys (sorted, `meta_`-prefixed),
/// then an optional embeddings column.
pub fn export_csv<W: Write>(chunks: &[Chunk], config: &ExportConfig, writer: W) -> ExportResult<()> {
    tracing::debug!(count = chunks.len(), delimiter = config.csv_delimiter as char, "exporting csv");
    let records: Vec<Value> = chunks.iter().map(|c| build_record(c, config)).collect();

    let mut meta_keys: BTreeSet<String> = BTreeSet::new();
    for record in &records {
        if let Some(Value::Object(meta)) = record.get("metadata") {
            meta_keys.extend(meta.keys().cloned());
        }
    }

    let mut columns = vec![
        config.chunk_id_column_name.clone(),
        config.text_column_name.clone(),
        "chunk_index".to_string(),
        "document_title".to_string(),
        "page_start".to_string(),
        "page_end".to_string(),
        "section_title".to_string(),
        "has_table".to_string(),
        "has_list".to_string(),
        "has_image".to_string(),
    ];
    for key in &meta_keys {
        columns.push(format!("meta_{key}"));
    }
    if config.include_embeddings {
        columns.push("embeddings".to_string());
    }

    let mut wtr = WriterBuilder::new()
        .delimiter(config.csv_delimiter)
        .from_writer(writer);

    if config.include_header {
        wtr.write_record(&columns)?;
    }

    for (index, (chunk, record)) in chunks.iter().zip(records.iter()).enumerate() {
        let mut row: Vec<String> = vec![
            chunk.id.clone(),
            if config.include_text { chunk.content.clone() } else { String::new() },
            chunk.metadata.chunk_index.to_string(),
            chunk.metadata.document_title.clone(),
            chunk.metadata.page_start.to_string(),
            chunk.metadata.page_end.to_string(),
            chunk.metadata.section_title.clone().unwrap_or_default(),
            chunk.metadata.has_table.to_string(),
            chunk.metadata.has_list.to_string(),
            chunk.metadata.has_image.to_string(),
        ];

        let meta_obj = record.get("metadata").and_then(Value::as_object);
        for key in &meta_keys {
            row.push(meta_obj.and_then(|m| m.get(key)).map(value_to_cell).unwrap_or_default());
        }

        if config.include_embeddings {
            let cell = chunk
                .embedding
                .as_ref()
                .map(|values| {
                    let parts: Vec<String> = values.iter().map(|v| format!("{v:.6}")).collect();
                    format!("[{}]", parts.join(","))
                })
                .unwrap_or_default();
            row.push(cell);
        }

        wtr.write_record(&row).map_err(|e| ExportError::Record {
            index,
            source: Box::new(ExportError::from(e)),
        })?;
    }

    wtr.flush()?;
    Ok(())
}

fn value_to_cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
