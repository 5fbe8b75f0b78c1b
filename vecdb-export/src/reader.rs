//! Read-back of chunked exports
//!
//! Loads `metadata.json`, checks each chunk file against its record and
//! reassembles the original keyword/embedding set.

use std::fs;
use std::path::Path;

use crate::codec;
use crate::dataset::KeywordVectorSet;
use crate::error::{ExportError, Result, Stage};
use crate::manifest::ExportManifest;

/// Reassemble a set from a chunked export directory
pub fn read_chunked(dir: impl AsRef<Path>) -> Result<KeywordVectorSet> {
    let dir = dir.as_ref();
    let manifest = ExportManifest::load(dir)?;
    manifest.validate()?;

    let dim = manifest.embedding_dimensions;
    // Matrix capacity follows the bytes actually read, not the manifest
    let mut keywords = Vec::with_capacity(manifest.total_keywords);
    let mut data = Vec::new();

    for record in &manifest.chunks {
        let path = dir.join(&record.filename);
        if !path.is_file() {
            return Err(ExportError::NotFound(path));
        }

        let len = fs::metadata(&path)
            .map_err(|e| ExportError::io(Stage::Verify, e))?
            .len();
        if len != record.byte_length {
            return Err(ExportError::format_at(
                Stage::Verify,
                format!(
                    "{} is {} bytes, expected {} ({} rows x {} dims x {})",
                    record.filename,
                    len,
                    record.byte_length,
                    record.keyword_count,
                    dim,
                    codec::F32_BYTES
                ),
            ));
        }

        let bytes = fs::read(&path).map_err(|e| ExportError::io(Stage::Verify, e))?;

        data.extend(codec::decode_f32_le(&bytes)?);
        keywords.extend(record.keywords.iter().cloned());
        log::debug!(
            "Read chunk {} ({} rows) from {}",
            record.chunk_id,
            record.keyword_count,
            record.filename
        );
    }

    log::info!(
        "Verified {} chunks, {} keywords, {} dims in {}",
        manifest.num_chunks,
        keywords.len(),
        dim,
        dir.display()
    );
    KeywordVectorSet::new(keywords, data, dim)
}
