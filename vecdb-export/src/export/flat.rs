//! Unchunked extracts: the bare keyword list and a single raw matrix file.

use std::path::Path;

use super::{ensure_dir, write_atomic, ExportFormat, ExportSummary};
use crate::codec;
use crate::dataset::KeywordVectorSet;
use crate::error::{ExportError, Result, Stage};

pub const KEYWORD_LIST_FILENAME: &str = "keywords_list.json";
pub const FLAT_BINARY_FILENAME: &str = "embeddings.bin";

/// Write `keywords_list.json`, a compact JSON array in input order
pub fn export_keyword_list(set: &KeywordVectorSet, dir: &Path) -> Result<ExportSummary> {
    ensure_dir(dir)?;
    let path = dir.join(KEYWORD_LIST_FILENAME);

    write_atomic(&path, Stage::KeywordsWrite, |w| {
        serde_json::to_writer(&mut *w, set.keywords())
            .map_err(|e| ExportError::encode(Stage::KeywordsWrite, e))
    })?;

    let total_bytes = super::total_size(std::slice::from_ref(&path), Stage::KeywordsWrite)?;
    log::info!("Extracted {} keywords to {}", set.len(), path.display());

    Ok(ExportSummary {
        format: ExportFormat::KeywordList,
        output_dir: dir.to_path_buf(),
        files: vec![path],
        total_keywords: set.len(),
        embedding_dimension: set.dim(),
        num_chunks: 0,
        total_bytes,
    })
}

/// Write `embeddings.bin`: all rows as headerless little-endian `f32`
pub fn export_flat_binary(set: &KeywordVectorSet, dir: &Path) -> Result<ExportSummary> {
    ensure_dir(dir)?;
    let path = dir.join(FLAT_BINARY_FILENAME);

    let mut written = 0usize;
    write_atomic(&path, Stage::EmbeddingsWrite, |w| {
        written = codec::write_f32_le(w, set.as_slice())
            .map_err(|e| ExportError::io(Stage::EmbeddingsWrite, e))?;
        Ok(())
    })?;
    log::info!("Saved embeddings binary: {} bytes", written);

    Ok(ExportSummary {
        format: ExportFormat::FlatBinary,
        output_dir: dir.to_path_buf(),
        files: vec![path],
        total_keywords: set.len(),
        embedding_dimension: set.dim(),
        num_chunks: 0,
        total_bytes: written as u64,
    })
}
