use std::io::Write;

use serde_json::Value;

use super::build_record;
use crate::chunk::Chunk;
use crate::config::ExportConfig;
use crate::error::ExportResult;

/// Write all chunks as a single JSON array.
pub fn export_json<W: Write>(chunks: &[Chunk], config: &ExportConfig, writer: W) -> ExportResult<()> {
    tracing::debug!(count = chunks.len(), "exporting json array");
    let records: Vec<Value> = chunks.iter().map(|c| build_record(c, config)).collect();
    let array = Value::Array(records);
    if config.pretty_print {
        serde_json::to_writer_pretty(writer, &array)?;
    } else {
        serde_json::to_writer(writer, &array)?;
    }
    Ok(())
}
