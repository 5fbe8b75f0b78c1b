//! Single-file JSON export.
//!
//! The whole database goes into one pretty-printed document with nested
//! embedding arrays. Size grows with N×D and the document is built in one
//! pass with no streaming reader support, so this layout only suits small
//! databases.

use std::path::Path;

use serde::{Serialize, Serializer};

use super::{ensure_dir, total_size, write_json_pretty, ExportFormat, ExportSummary};
use crate::dataset::KeywordVectorSet;
use crate::error::{ExportError, Result, Stage};
use crate::manifest::FORMAT_VERSION;

/// Output file name inside the export directory
pub const JSON_FILENAME: &str = "vector_database.json";

#[derive(Serialize)]
struct JsonDatabase<'a> {
    keywords: &'a [String],
    embeddings: Rows<'a>,
    version: &'static str,
    total_keywords: usize,
    embedding_dimension: usize,
}

/// Serializes the matrix as an array of row arrays without copying it
struct Rows<'a>(&'a KeywordVectorSet);

impl Serialize for Rows<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.rows())
    }
}

/// Write `vector_database.json` under `dir`
pub fn export_json(set: &KeywordVectorSet, dir: &Path) -> Result<ExportSummary> {
    // serde_json writes NaN and infinities as null
    if let Err(e) = set.ensure_finite() {
        return Err(ExportError::encode(Stage::JsonWrite, e));
    }

    ensure_dir(dir)?;
    let path = dir.join(JSON_FILENAME);
    log::info!("Converting to JSON format: {}", path.display());

    let document = JsonDatabase {
        keywords: set.keywords(),
        embeddings: Rows(set),
        version: FORMAT_VERSION,
        total_keywords: set.len(),
        embedding_dimension: set.dim(),
    };
    write_json_pretty(&path, &document, Stage::JsonWrite)?;

    let files = vec![path];
    let total_bytes = total_size(&files, Stage::JsonWrite)?;
    log::info!(
        "JSON file created: {:.2} MB",
        total_bytes as f64 / (1024.0 * 1024.0)
    );

    Ok(ExportSummary {
        format: ExportFormat::Json,
        output_dir: dir.to_path_buf(),
        files,
        total_keywords: set.len(),
        embedding_dimension: set.dim(),
        num_chunks: 0,
        total_bytes,
    })
}
