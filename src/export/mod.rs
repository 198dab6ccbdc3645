// Exporters — JSONL/JSON/CSV/TSV plus vector-DB adapters, batch and
// streaming. See spec.md §4.9/§6/§7.

pub mod batch;
pub mod csv;
pub mod json;
pub mod jsonl;
pub mod streaming;
pub mod vectordb;

use serde_json::{Map, Value};

use crate::chunk::Chunk;
use crate::config::ExportConfig;

/// Build the JSON record for one chunk, honoring `ExportConfig`'s field
/// selection and flattening flags. Shared by every serialization target.
pub(crate) fn build_record(chunk: &Chunk, config: &ExportConfig) -> Value {
    let mut map = Map::new();
    map.insert("id".to_string(), Value::String(chunk.id.clone()));
    if config.include_text {
        map.insert(config.text_column_name.clone(), Value::String(chunk.content.clone()));
    }
    map.insert(
        "documentTitle".to_string(),
        Value::String(chunk.metadata.document_title.clone()),
    );
    map.insert("pageStart".to_string(), Value::from(chunk.metadata.page_start));
    map.insert("pageEnd".to_string(), Value::from(chunk.metadata.page_end));
    map.insert("chunkIndex".to_string(), Value::from(chunk.metadata.chunk_index));
    map.insert(
        "sectionTitle".to_string(),
        chunk
            .metadata
            .section_title
            .clone()
            .map(Value::String)
            .unwrap_or(Value::Null),
    );
    map.insert(
        "sectionPath".to_string(),
        Value::Array(chunk.metadata.section_path.iter().cloned().map(Value::String).collect()),
    );
    map.insert("hasTable".to_string(), Value::Bool(chunk.metadata.has_table));
    map.insert("hasList".to_string(), Value::Bool(chunk.metadata.has_list));
    map.insert("hasImage".to_string(), Value::Bool(chunk.metadata.has_image));

    if config.include_metadata {
        let mut metadata_value = serde_json::to_value(&chunk.metadata).unwrap_or(Value::Null);
        if let Some(fields) = &config.metadata_fields {
            if let Value::Object(obj) = &metadata_value {
                let filtered: Map<String, Value> = obj
                    .iter()
                    .filter(|(k, _)| fields.iter().any(|f| f == *k))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                metadata_value = Value::Object(filtered);
            }
        }
        if config.flatten_metadata {
            let mut flat = Map::new();
            flatten_into(&metadata_value, "", &mut flat);
            map.insert("metadata".to_string(), Value::Object(flat));
        } else {
            map.insert("metadata".to_string(), metadata_value);
        }
    }

    if config.include_embeddings {
        if let Some(embedding) = &chunk.embedding {
            let values: Vec<Value> = embedding.iter().map(|v| Value::from(round6(*v))).collect();
            map.insert("embeddings".to_string(), Value::Array(values));
        }
    }

    Value::Object(map)
}

/// Flatten nested objects into dot-notation keys (`a.b.c`). Arrays and
/// scalars are left as-is at their flattened key.
pub(crate) fn flatten_into(value: &Value, prefix: &str, out: &mut Map<String, Value>) {
    match value {
        Value::Object(obj) => {
            for (key, val) in obj {
                let full_key = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_into(val, &full_key, out);
            }
        }
        other => {
            out.insert(prefix.to_string(), other.clone());
        }
    }
}

fn round6(value: f32) -> f64 {
    ((value as f64) * 1_000_000.0).round() / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{ChunkLevel, ChunkMetadata};

    fn sample_chunk() -> Chunk {
        let metadata = ChunkMetadata {
            document_title: "Doc".into(),
            section_path: vec!["Intro".into()],
            section_title: Some("Intro".into()),
            heading_level: None,
            page_start: 1,
            page_end: 1,
            chunk_index: 0,
            total_chunks: 1,
            level: ChunkLevel::Paragraph,
            parent_id: None,
            child_ids: Vec::new(),
            element_types: vec!["paragraph".to_string()],
            has_table: false,
            has_list: false,
            has_image: false,
            char_count: 5,
            word_count: 1,
            estimated_tokens: 1,
            bbox: None,
        };
        Chunk::new("chunk-0", "Hello", metadata)
    }

    #[test]
    fn build_record_omits_text_when_disabled() {
        let chunk = sample_chunk();
        let config = ExportConfig {
            include_text: false,
            ..ExportConfig::default()
        };
        let record = build_record(&chunk, &config);
        assert!(record.get("text").is_none());
        assert!(record.get("documentTitle").is_some());
    }

    #[test]
    fn flatten_into_produces_dot_notation_keys() {
        let value = serde_json::json!({"a": {"b": {"c": 1}}});
        let mut out = Map::new();
        flatten_into(&value, "", &mut out);
        assert_eq!(out.get("a.b.c"), Some(&Value::from(1)));
    }

    #[test]
    fn metadata_fields_filter_restricts_keys() {
        let chunk = sample_chunk();
        let config = ExportConfig {
            metadata_fields: Some(vec!["document_title".to_string()]),
            flatten_metadata: false,
            ..ExportConfig::default()
        };
        let record = build_record(&chunk, &config);
        let metadata = record.get("metadata").unwrap().as_object().unwrap();
        assert_eq!(metadata.len(), 1);
        assert!(metadata.contains_key("document_title"));
    }
}
