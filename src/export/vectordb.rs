use serde_json::{json, Value};

use crate::chunk::Chunk;
use crate::error::ExportResult;

/// Single JSON document `{vectors: [...]}`. Chunks with no embedding are
/// skipped — Pinecone cannot index a vector-less record.
pub fn export_pinecone(chunks: &[Chunk]) -> Value {
    let vectors: Vec<Value> = chunks
        .iter()
        .filter_map(|chunk| {
            let embedding = chunk.embedding.as_ref()?;
            Some(json!({
                "id": chunk.id,
                "values": embedding,
                "metadata": {
                    "text": chunk.content,
                    "document_title": chunk.metadata.document_title,
                    "page_start": chunk.metadata.page_start,
                    "section_title": chunk.metadata.section_title,
                }
            }))
        })
        .collect();
    json!({ "vectors": vectors })
}

/// Single JSON document with columnar arrays. The `embeddings` key is
/// omitted entirely when no chunk carries one.
pub fn export_chroma(chunks: &[Chunk]) -> Value {
    let ids: Vec<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
    let documents: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
    let metadatas: Vec<Value> = chunks
        .iter()
        .map(|c| {
            json!({
                "document_title": c.metadata.document_title,
                "page_start": c.metadata.page_start,
                "page_end": c.metadata.page_end,
                "section_title": c.metadata.section_title,
            })
        })
        .collect();

    let mut doc = json!({
        "ids": ids,
        "documents": documents,
        "metadatas": metadatas,
    });

    if chunks.iter().any(|c| c.embedding.is_some()) {
        let embeddings: Vec<Option<&Vec<f32>>> = chunks.iter().map(|c| c.embedding.as_ref()).collect();
        doc["embeddings"] = json!(embeddings);
    }

    doc
}

/// One JSONL line per chunk: `{class, id, properties, vector?}`.
pub fn export_weaviate_lines(chunks: &[Chunk], class: &str) -> ExportResult<Vec<String>> {
    chunks
        .iter()
        .map(|chunk| {
            let mut record = json!({
                "class": class,
                "id": chunk.id,
                "properties": {
                    "content": chunk.content,
                    "documentTitle": chunk.metadata.document_title,
                    "pageStart": chunk.metadata.page_start,
                    "sectionTitle": chunk.metadata.section_title,
                    "chunkIndex": chunk.metadata.chunk_index,
                }
            });
            if let Some(vector) = &chunk.embedding {
                record["vector"] = json!(vector);
            }
            Ok(serde_json::to_string(&record)?)
        })
        .collect()
}
