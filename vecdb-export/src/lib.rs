//! Keyword Embedding Export
//!
//! Converts a serialized keyword/embedding database into layouts other
//! runtimes can load without the original producer.
//!
//! ## Layouts
//!
//! - **Chunked binary** - `chunk_NNN.bin` files of raw little-endian `f32`
//!   rows plus a `metadata.json` index (the format with a round-trip contract)
//! - **Single JSON** - one document with keywords and nested arrays
//! - **CSV + binary** - `keywords.csv`, a bincode matrix blob and a manifest
//! - **Keyword list** / **flat binary** - bare extracts of either half
//!
//! ## Example
//!
//! ```ignore
//! use vecdb_export::{ExportConfig, ExportFormat, Exporter};
//!
//! let config = ExportConfig::new("vector_database.json", "vector_database_chunks")
//!     .with_chunk_size(2000)
//!     .with_embedding_dim(384);
//! let exporter = Exporter::new(config)?;
//! let summary = exporter.run(ExportFormat::ChunkedBinary)?;
//!
//! let restored = vecdb_export::read_chunked(&summary.output_dir)?;
//! assert_eq!(restored.len(), summary.total_keywords);
//! ```

pub mod chunk;
pub mod codec;
pub mod config;
pub mod dataset;
pub mod error;
pub mod export;
pub mod loader;
pub mod manifest;
pub mod reader;

// Re-exports for convenience
pub use config::{ExportConfig, DEFAULT_CHUNK_SIZE};
pub use dataset::{KeywordTable, KeywordVectorSet};
pub use error::{ExportError, Result, Stage};
pub use export::{ExportFormat, ExportSummary, Exporter};
pub use loader::{load_dataset, save_container, ContainerFormat};
pub use manifest::{ChunkMetadataRecord, CsvBinaryManifest, ExportManifest};
pub use reader::read_chunked;
