//! CSV + binary export
//!
//! Produces three files:
//! - `keywords.csv`: the keyword table (or a lone `keyword` column), UTF-8,
//!   comma-delimited, quoted only where needed
//! - `embeddings.bincode`: the matrix as a bincode-encoded [`EmbeddingMatrix`]
//! - `metadata.json`: a [`CsvBinaryManifest`] naming both
//!
//! The matrix blob uses Rust's serde/bincode encoding, not NumPy `.npy` or
//! any other ecosystem's array format. Its framing (little-endian `u64`
//! header fields and a `u64` length prefix before the values) is specific to
//! bincode 1.x. Consumers outside Rust should read the chunked layout instead.

use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    ensure_dir, remove_stale, total_size, write_atomic, write_json_pretty, ExportFormat,
    ExportSummary,
};
use crate::dataset::{KeywordVectorSet, KEYWORD_COLUMN};
use crate::error::{ExportError, Result, Stage};
use crate::manifest::{CsvBinaryManifest, FORMAT_VERSION, MANIFEST_FILENAME};

pub const KEYWORDS_CSV: &str = "keywords.csv";
pub const EMBEDDINGS_BLOB: &str = "embeddings.bincode";
/// Value of `embeddings_encoding` in the manifest
pub const EMBEDDINGS_ENCODING: &str = "bincode-1/f32-matrix";

/// Owned matrix as stored in `embeddings.bincode`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingMatrix {
    pub rows: u64,
    pub dim: u64,
    /// Row-major
    pub data: Vec<f32>,
}

/// Borrowed twin of [`EmbeddingMatrix`]; encodes to identical bytes
#[derive(Serialize)]
struct EmbeddingMatrixRef<'a> {
    rows: u64,
    dim: u64,
    data: &'a [f32],
}

/// Write the CSV, the matrix blob and the manifest under `dir`
pub fn export_csv_binary(
    set: &KeywordVectorSet,
    dir: &Path,
    created_at: Option<DateTime<Utc>>,
) -> Result<ExportSummary> {
    ensure_dir(dir)?;
    let manifest_path = dir.join(MANIFEST_FILENAME);
    remove_stale(&manifest_path)?;
    log::info!("Converting to CSV + binary format in {}", dir.display());

    let csv_path = dir.join(KEYWORDS_CSV);
    write_atomic(&csv_path, Stage::CsvWrite, |w| {
        write_keywords_csv(w, set).map_err(|e| ExportError::io(Stage::CsvWrite, e))
    })?;
    log::info!("Keywords CSV saved: {}", csv_path.display());

    let blob_path = dir.join(EMBEDDINGS_BLOB);
    let matrix = EmbeddingMatrixRef {
        rows: set.len() as u64,
        dim: set.dim() as u64,
        data: set.as_slice(),
    };
    write_atomic(&blob_path, Stage::EmbeddingsWrite, |w| {
        bincode::serialize_into(&mut *w, &matrix)
            .map_err(|e| ExportError::encode(Stage::EmbeddingsWrite, e))
    })?;
    log::info!("Embeddings binary saved: {}", blob_path.display());

    let manifest = CsvBinaryManifest {
        version: FORMAT_VERSION.to_string(),
        created_at,
        total_keywords: set.len(),
        embedding_dimension: set.dim(),
        keywords_file: KEYWORDS_CSV.to_string(),
        embeddings_file: EMBEDDINGS_BLOB.to_string(),
        embeddings_encoding: EMBEDDINGS_ENCODING.to_string(),
        complete: true,
    };
    write_json_pretty(&manifest_path, &manifest, Stage::ManifestWrite)?;
    log::info!("Metadata saved: {}", manifest_path.display());

    let files = vec![csv_path, blob_path, manifest_path];
    let total_bytes = total_size(&files, Stage::ManifestWrite)?;
    Ok(ExportSummary {
        format: ExportFormat::CsvBinary,
        output_dir: dir.to_path_buf(),
        files,
        total_keywords: set.len(),
        embedding_dimension: set.dim(),
        num_chunks: 0,
        total_bytes,
    })
}

/// Read `embeddings.bincode` back
pub fn read_embeddings_blob(path: impl AsRef<Path>) -> Result<EmbeddingMatrix> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ExportError::NotFound(path.to_path_buf()));
    }
    let bytes = fs::read(path).map_err(|e| ExportError::io(Stage::Verify, e))?;
    let matrix: EmbeddingMatrix =
        bincode::deserialize(&bytes).map_err(|e| ExportError::encode(Stage::Verify, e))?;

    if matrix.rows.checked_mul(matrix.dim) != Some(matrix.data.len() as u64) {
        return Err(ExportError::format_at(
            Stage::Verify,
            format!(
                "embeddings blob holds {} values, expected {}x{}",
                matrix.data.len(),
                matrix.rows,
                matrix.dim
            ),
        ));
    }
    Ok(matrix)
}

fn write_keywords_csv<W: Write>(w: &mut W, set: &KeywordVectorSet) -> std::io::Result<()> {
    match set.table() {
        Some(table) => {
            write_record(w, table.columns().iter().map(String::as_str))?;
            for row in table.rows() {
                write_record(w, row.iter().map(String::as_str))?;
            }
        }
        None => {
            write_record(w, [KEYWORD_COLUMN])?;
            for keyword in set.keywords() {
                write_record(w, [keyword.as_str()])?;
            }
        }
    }
    Ok(())
}

fn write_record<'a, W, I>(w: &mut W, fields: I) -> std::io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a str>,
{
    let line = fields
        .into_iter()
        .map(escape_csv)
        .collect::<Vec<_>>()
        .join(",");
    writeln!(w, "{}", line)
}

/// Quote a field if it holds a delimiter, quote or line break
fn escape_csv(s: &str) -> String {
    if s.contains(|c: char| matches!(c, ',' | '"' | '\n' | '\r')) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
