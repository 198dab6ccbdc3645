// ragchunk — structure-aware chunking engine and export adapters for RAG
// pipelines. See spec.md for the full component contract; SPEC_FULL.md
// and DESIGN.md record how this crate expands and grounds it.

pub mod boundary;
pub mod builder;
pub mod chunk;
pub mod collection;
pub mod config;
pub mod error;
pub mod export;
pub mod list;
pub mod model;
pub mod overlap;
pub mod section;
pub mod size;
pub mod table;

pub use builder::{build_chunks, ChunkBuilder};
pub use chunk::{Chunk, ChunkLevel, ChunkMetadata};
pub use collection::{ChunkCollection, CollectionStatistics};
pub use config::{ChunkerConfig, ExportConfig, ExportFormat};
pub use error::{ChunkError, ChunkResult, ExportError, ExportResult};
pub use model::{BBox, Cell, Document, DocumentMetadata, Element, Layout, Page, TocEntry};

/// Initialise a `tracing` subscriber reading its filter from `RUST_LOG`
/// (defaulting to `info`). Convenience helper for binaries and tests that
/// embed this crate; the library itself never initialises a subscriber on
/// its own.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init();
}
