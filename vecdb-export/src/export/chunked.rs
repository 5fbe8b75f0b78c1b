//! Chunked binary export
//!
//! Writes `chunk_NNN.bin` files of raw little-endian `f32` rows followed by
//! `metadata.json`. Chunk files are written one at a time, each flushed and
//! closed before the next is opened.
//!
//! A failure part-way leaves the chunk files written so far in place; they are
//! not rolled back. The manifest is removed before the first chunk and only
//! written after the last one, so a failed run never leaves a manifest behind.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};

use super::{ensure_dir, remove_stale, write_json_pretty, ExportFormat, ExportSummary};
use crate::chunk::{self, Chunk};
use crate::codec;
use crate::dataset::KeywordVectorSet;
use crate::error::{ExportError, Result, Stage};
use crate::manifest::{ChunkMetadataRecord, ExportManifest, FORMAT_VERSION, MANIFEST_FILENAME};

/// Split `set` into chunks of `chunk_size` rows and write them under `dir`
pub fn export_chunked(
    set: &KeywordVectorSet,
    dir: &Path,
    chunk_size: usize,
    created_at: Option<DateTime<Utc>>,
) -> Result<ExportSummary> {
    let chunks = chunk::split(set, chunk_size)?;

    ensure_dir(dir)?;
    let manifest_path = dir.join(MANIFEST_FILENAME);
    remove_stale(&manifest_path)?;

    log::info!(
        "Creating {} chunks of ~{} keywords each in {}",
        chunks.len(),
        chunk_size,
        dir.display()
    );

    let mut records = Vec::with_capacity(chunks.len());
    let mut files = Vec::with_capacity(chunks.len() + 1);
    let mut total_bytes = 0u64;

    for chunk in &chunks {
        let filename = chunk::chunk_filename(chunk.span.chunk_id);
        let path = dir.join(&filename);
        let byte_length = write_chunk(&path, chunk)?;

        log::info!(
            "Created chunk {}/{}: keywords {}..{} ({} KB) -> {}",
            chunk.span.chunk_id + 1,
            chunks.len(),
            chunk.span.start,
            chunk.span.end,
            byte_length / 1024,
            filename
        );

        total_bytes += byte_length;
        files.push(path);
        records.push(ChunkMetadataRecord {
            chunk_id: chunk.span.chunk_id,
            filename,
            start_index: chunk.span.start,
            end_index: chunk.span.end,
            keyword_count: chunk.span.len(),
            byte_length,
            keywords: chunk.keywords.to_vec(),
        });
    }

    let manifest = ExportManifest {
        version: FORMAT_VERSION.to_string(),
        created_at,
        total_keywords: set.len(),
        embedding_dimensions: set.dim(),
        chunk_size,
        num_chunks: records.len(),
        complete: true,
        chunks: records,
    };
    write_json_pretty(&manifest_path, &manifest, Stage::ManifestWrite)?;
    log::info!("Metadata saved to {}", manifest_path.display());

    files.push(manifest_path);
    Ok(ExportSummary {
        format: ExportFormat::ChunkedBinary,
        output_dir: dir.to_path_buf(),
        files,
        total_keywords: set.len(),
        embedding_dimension: set.dim(),
        num_chunks: manifest.num_chunks,
        total_bytes,
    })
}

/// Write one chunk's rows; returns the byte length written
fn write_chunk(path: &Path, chunk: &Chunk<'_>) -> Result<u64> {
    let stage = Stage::Chunk(chunk.span.chunk_id);

    let file = File::create(path).map_err(|e| ExportError::io(stage, e))?;
    let mut writer = BufWriter::new(file);
    let written =
        codec::write_f32_le(&mut writer, chunk.embeddings).map_err(|e| ExportError::io(stage, e))?;
    writer.flush().map_err(|e| ExportError::io(stage, e))?;

    Ok(written as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn abc_set() -> KeywordVectorSet {
        KeywordVectorSet::new(
            vec!["a".into(), "b".into(), "c".into()],
            vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6],
            2,
        )
        .unwrap()
    }

    #[test]
    fn test_three_keywords_chunk_size_two() {
        let temp_dir = TempDir::new().unwrap();
        let summary = export_chunked(&abc_set(), temp_dir.path(), 2, None).unwrap();

        assert_eq!(summary.num_chunks, 2);
        assert_eq!(summary.total_bytes, 24);
        assert_eq!(
            fs::metadata(temp_dir.path().join("chunk_000.bin")).unwrap().len(),
            16
        );
        assert_eq!(
            fs::metadata(temp_dir.path().join("chunk_001.bin")).unwrap().len(),
            8
        );

        let manifest = ExportManifest::load(temp_dir.path()).unwrap();
        manifest.validate().unwrap();
        assert_eq!(manifest.chunks[0].keywords, vec!["a", "b"]);
        assert_eq!(
            (manifest.chunks[0].start_index, manifest.chunks[0].end_index),
            (0, 2)
        );
        assert_eq!(manifest.chunks[1].keywords, vec!["c"]);
        assert_eq!(
            (manifest.chunks[1].start_index, manifest.chunks[1].end_index),
            (2, 3)
        );
        assert!(manifest.created_at.is_none());
    }

    #[test]
    fn test_chunk_bytes_are_little_endian_rows() {
        let temp_dir = TempDir::new().unwrap();
        export_chunked(&abc_set(), temp_dir.path(), 2, None).unwrap();

        let bytes = fs::read(temp_dir.path().join("chunk_001.bin")).unwrap();
        let mut expected = Vec::new();
        expected.extend_from_slice(&0.5f32.to_le_bytes());
        expected.extend_from_slice(&0.6f32.to_le_bytes());
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_empty_set_writes_manifest_only() {
        let temp_dir = TempDir::new().unwrap();
        let set = KeywordVectorSet::new(vec![], vec![], 384).unwrap();
        let summary = export_chunked(&set, temp_dir.path(), 2000, None).unwrap();

        assert_eq!(summary.num_chunks, 0);
        assert_eq!(summary.files.len(), 1);
        let manifest = ExportManifest::load(temp_dir.path()).unwrap();
        assert_eq!(manifest.total_keywords, 0);
        assert!(manifest.chunks.is_empty());
        manifest.validate().unwrap();
    }

    #[test]
    fn test_failed_chunk_leaves_no_manifest() {
        let temp_dir = TempDir::new().unwrap();
        // Stale manifest from an earlier run
        fs::write(temp_dir.path().join(MANIFEST_FILENAME), "{}").unwrap();
        // A directory where chunk 1 should go makes its write fail
        fs::create_dir(temp_dir.path().join("chunk_001.bin")).unwrap();

        let err = export_chunked(&abc_set(), temp_dir.path(), 2, None).unwrap_err();
        assert_eq!(err.stage(), Stage::Chunk(1));
        assert!(!temp_dir.path().join(MANIFEST_FILENAME).exists());
        // Earlier chunk is not rolled back
        assert!(temp_dir.path().join("chunk_000.bin").is_file());
    }

    #[test]
    fn test_timestamp_recorded_when_given() {
        let temp_dir = TempDir::new().unwrap();
        let now = Utc::now();
        export_chunked(&abc_set(), temp_dir.path(), 3, Some(now)).unwrap();

        let manifest = ExportManifest::load(temp_dir.path()).unwrap();
        assert_eq!(manifest.created_at, Some(now));
        assert_eq!(manifest.num_chunks, 1);
    }
}
