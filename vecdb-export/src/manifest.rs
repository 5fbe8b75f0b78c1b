//! Manifest records written next to exported data
//!
//! The chunked layout is described by an [`ExportManifest`] listing each
//! chunk's file, exclusive row range and keyword list. The CSV + binary
//! layout gets a smaller [`CsvBinaryManifest`] naming its two files.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::codec;
use crate::error::{ExportError, Result, Stage};

/// Version string stamped on every output document
pub const FORMAT_VERSION: &str = "1.0.0";

/// Manifest file name inside an export directory
pub const MANIFEST_FILENAME: &str = "metadata.json";

/// Description of one chunk file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadataRecord {
    pub chunk_id: usize,
    pub filename: String,
    pub start_index: usize,
    /// Exclusive
    pub end_index: usize,
    pub keyword_count: usize,
    pub byte_length: u64,
    /// Keywords of this chunk in global order; position is the local row index
    pub keywords: Vec<String>,
}

/// Index of a chunked binary export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportManifest {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    pub total_keywords: usize,
    pub embedding_dimensions: usize,
    pub chunk_size: usize,
    pub num_chunks: usize,
    /// False marks a manifest whose chunk files must not be trusted
    pub complete: bool,
    pub chunks: Vec<ChunkMetadataRecord>,
}

impl ExportManifest {
    /// Read `metadata.json` from an export directory
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let path = dir.as_ref().join(MANIFEST_FILENAME);
        if !path.exists() {
            return Err(ExportError::NotFound(path));
        }
        let bytes = fs::read(&path).map_err(|e| ExportError::io(Stage::Verify, e))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| invalid(format!("invalid manifest {}: {}", path.display(), e)))
    }

    /// Check the manifest is internally consistent.
    ///
    /// Chunks must be in ascending id order, tile `[0, total_keywords)`
    /// without gaps, and each record's keyword list and byte length must
    /// agree with its row count.
    pub fn validate(&self) -> Result<()> {
        if !self.complete {
            return Err(invalid("manifest is marked incomplete"));
        }
        if self.chunk_size == 0 {
            return Err(invalid("manifest chunk_size is 0"));
        }
        if self.num_chunks != self.chunks.len() {
            return Err(invalid(format!(
                "manifest lists {} chunks but num_chunks is {}",
                self.chunks.len(),
                self.num_chunks
            )));
        }
        if codec::checked_encoded_len(self.total_keywords, self.embedding_dimensions).is_none() {
            return Err(invalid(format!(
                "{} keywords x {} dims overflows the addressable size",
                self.total_keywords, self.embedding_dimensions
            )));
        }

        let mut next_start = 0;
        for (position, record) in self.chunks.iter().enumerate() {
            if record.chunk_id != position {
                return Err(invalid(format!(
                    "chunk at position {} has id {}",
                    position, record.chunk_id
                )));
            }
            if record.start_index != next_start || record.end_index < record.start_index {
                return Err(invalid(format!(
                    "chunk {} range [{}, {}) does not continue from row {}",
                    record.chunk_id, record.start_index, record.end_index, next_start
                )));
            }
            let rows = record.end_index - record.start_index;
            if record.keyword_count != rows || record.keywords.len() != rows {
                return Err(invalid(format!(
                    "chunk {} covers {} rows but lists {} keywords (keyword_count {})",
                    record.chunk_id,
                    rows,
                    record.keywords.len(),
                    record.keyword_count
                )));
            }
            let expected = codec::checked_encoded_len(rows, self.embedding_dimensions)
                .ok_or_else(|| {
                    invalid(format!(
                        "chunk {} size overflows ({} rows x {} dims)",
                        record.chunk_id, rows, self.embedding_dimensions
                    ))
                })?;
            if record.byte_length != expected as u64 {
                return Err(invalid(format!(
                    "chunk {} byte_length is {}, expected {}",
                    record.chunk_id, record.byte_length, expected
                )));
            }
            next_start = record.end_index;
        }

        if next_start != self.total_keywords {
            return Err(invalid(format!(
                "chunks cover {} keywords but total_keywords is {}",
                next_start, self.total_keywords
            )));
        }
        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> ExportError {
    ExportError::format_at(Stage::Verify, msg)
}

/// Index of a CSV + binary export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvBinaryManifest {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    pub total_keywords: usize,
    pub embedding_dimension: usize,
    pub keywords_file: String,
    pub embeddings_file: String,
    /// Encoding of `embeddings_file`; see [`crate::export::csv`]
    pub embeddings_encoding: String,
    pub complete: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(chunk_id: usize, start: usize, end: usize, dim: usize) -> ChunkMetadataRecord {
        ChunkMetadataRecord {
            chunk_id,
            filename: format!("chunk_{:03}.bin", chunk_id),
            start_index: start,
            end_index: end,
            keyword_count: end - start,
            byte_length: codec::encoded_len(end - start, dim) as u64,
            keywords: (start..end).map(|i| format!("kw{}", i)).collect(),
        }
    }

    fn manifest() -> ExportManifest {
        ExportManifest {
            version: FORMAT_VERSION.to_string(),
            created_at: None,
            total_keywords: 3,
            embedding_dimensions: 2,
            chunk_size: 2,
            num_chunks: 2,
            complete: true,
            chunks: vec![record(0, 0, 2, 2), record(1, 2, 3, 2)],
        }
    }

    #[test]
    fn test_valid_manifest() {
        assert!(manifest().validate().is_ok());
    }

    #[test]
    fn test_incomplete_manifest_rejected() {
        let mut m = manifest();
        m.complete = false;
        assert!(m.validate().unwrap_err().to_string().contains("incomplete"));
    }

    #[test]
    fn test_gap_rejected() {
        let mut m = manifest();
        m.chunks[1] = record(1, 3, 3, 2);
        assert!(m.validate().is_err());
    }

    #[test]
    fn test_byte_length_mismatch_rejected() {
        let mut m = manifest();
        m.chunks[0].byte_length = 12;
        assert!(m.validate().unwrap_err().to_string().contains("byte_length"));
    }

    #[test]
    fn test_total_mismatch_rejected() {
        let mut m = manifest();
        m.total_keywords = 4;
        assert!(m.validate().is_err());
    }

    #[test]
    fn test_oversized_dimensions_rejected() {
        let mut m = manifest();
        m.embedding_dimensions = 1 << 62;
        let err = m.validate().unwrap_err();
        assert_eq!(err.stage(), Stage::Verify);
        assert!(err.to_string().contains("overflows"));

        let mut m = manifest();
        m.total_keywords = usize::MAX;
        m.embedding_dimensions = 2;
        assert!(m.validate().unwrap_err().to_string().contains("overflows"));
    }

    #[test]
    fn test_created_at_omitted_when_absent() {
        let json = serde_json::to_value(manifest()).unwrap();
        assert!(json.get("created_at").is_none());
        assert_eq!(json["chunks"][1]["end_index"], 3);
        assert_eq!(json["embedding_dimensions"], 2);
    }
}
