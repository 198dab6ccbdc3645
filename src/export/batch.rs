use serde_json::Value;

use super::build_record;
use crate::chunk::Chunk;
use crate::config::ExportConfig;
use crate::error::{ExportError, ExportResult};

/// One consecutive slice of the chunk sequence handed to a batch
/// callback.
#[derive(Debug, Clone)]
pub struct Batch {
    pub batch_number: usize,
    pub start_index: usize,
    pub end_index: usize,
    pub chunk_count: usize,
    pub data: Vec<Value>,
}

/// Export `chunks` in consecutive batches of `batch_size`, invoking
/// `consume` for each. A callback failure short-circuits the run; the
/// failing batch number is attached to the returned error.
pub fn export_batches(
    chunks: &[Chunk],
    config: &ExportConfig,
    batch_size: usize,
    mut consume: impl FnMut(&Batch) -> ExportResult<()>,
) -> ExportResult<()> {
    let batch_size = batch_size.max(1);
    tracing::debug!(total = chunks.len(), batch_size, "starting batch export");
    for (batch_number, group) in chunks.chunks(batch_size).enumerate() {
        let start_index = batch_number * batch_size;
        let batch = Batch {
            batch_number,
            start_index,
            end_index: start_index + group.len() - 1,
            chunk_count: group.len(),
            data: group.iter().map(|c| build_record(c, config)).collect(),
        };
        consume(&batch).map_err(|e| {
            tracing::warn!(batch = batch_number, error = %e, "batch export callback failed");
            ExportError::Batch {
                index: batch_number,
                source: Box::new(e),
            }
        })?;
    }
    Ok(())
}
