//! Export strategies
//!
//! Every layout is a single-shot writer over a loaded [`KeywordVectorSet`].
//! [`Exporter`] owns the run configuration, loads the input once and
//! dispatches to the writer selected by [`ExportFormat`].

pub mod chunked;
pub mod csv;
pub mod flat;
pub mod json;

use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::ExportConfig;
use crate::dataset::KeywordVectorSet;
use crate::error::{ExportError, Result, Stage};
use crate::loader::load_dataset;

/// Output layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// One JSON document with keywords and nested embedding arrays
    Json,
    /// Raw little-endian chunk files plus `metadata.json`
    ChunkedBinary,
    /// `keywords.csv`, a bincode matrix blob and `metadata.json`
    CsvBinary,
    /// `keywords_list.json` only
    KeywordList,
    /// The whole matrix as one headerless little-endian file
    FlatBinary,
}

impl ExportFormat {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::ChunkedBinary => "chunked",
            Self::CsvBinary => "csv",
            Self::KeywordList => "keywords",
            Self::FlatBinary => "flat",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a finished export produced
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    pub format: ExportFormat,
    pub output_dir: PathBuf,
    /// Every file written, data files before manifests
    pub files: Vec<PathBuf>,
    pub total_keywords: usize,
    pub embedding_dimension: usize,
    /// Zero for layouts without chunking
    pub num_chunks: usize,
    pub total_bytes: u64,
}

/// Configured single-run exporter
#[derive(Debug, Clone)]
pub struct Exporter {
    config: ExportConfig,
}

impl Exporter {
    pub fn new(config: ExportConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Load the configured input
    pub fn load(&self) -> Result<KeywordVectorSet> {
        load_dataset(&self.config.input_path, self.config.embedding_dim)
    }

    /// Load the input and export it in one call
    pub fn run(&self, format: ExportFormat) -> Result<ExportSummary> {
        let set = self.load()?;
        self.export(&set, format)
    }

    /// Export into the configured output directory
    pub fn export(&self, set: &KeywordVectorSet, format: ExportFormat) -> Result<ExportSummary> {
        self.export_to(set, format, &self.config.output_dir)
    }

    /// Export into an explicit directory
    pub fn export_to(
        &self,
        set: &KeywordVectorSet,
        format: ExportFormat,
        dir: &Path,
    ) -> Result<ExportSummary> {
        let created_at = self.created_at();
        match format {
            ExportFormat::Json => json::export_json(set, dir),
            ExportFormat::ChunkedBinary => {
                chunked::export_chunked(set, dir, self.config.chunk_size, created_at)
            }
            ExportFormat::CsvBinary => csv::export_csv_binary(set, dir, created_at),
            ExportFormat::KeywordList => flat::export_keyword_list(set, dir),
            ExportFormat::FlatBinary => flat::export_flat_binary(set, dir),
        }
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.config.include_timestamp.then(Utc::now)
    }
}

/// Create the output directory (and parents)
pub(crate) fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| ExportError::io(Stage::Prepare, e))
}

/// Delete a manifest left by an earlier run so a failed run never leaves one
/// pointing at files this run did not produce
pub(crate) fn remove_stale(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            log::debug!("Removed stale {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ExportError::io(Stage::Prepare, e)),
    }
}

/// Write `path` through a sibling temp file that is renamed into place once
/// `write` succeeds; the destination never holds a partial file
pub(crate) fn write_atomic<F>(path: &Path, stage: Stage, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp_path = path.with_file_name(format!(".{}.tmp", file_name));

    let result = (|| {
        let file = File::create(&tmp_path).map_err(|e| ExportError::io(stage, e))?;
        let mut writer = BufWriter::new(file);
        write(&mut writer)?;
        writer.flush().map_err(|e| ExportError::io(stage, e))?;
        let file = writer
            .into_inner()
            .map_err(|e| ExportError::io(stage, e.into_error()))?;
        file.sync_all().map_err(|e| ExportError::io(stage, e))?;
        fs::rename(&tmp_path, path).map_err(|e| ExportError::io(stage, e))
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

/// Serialize a value as pretty JSON (2-space indent) via [`write_atomic`]
pub(crate) fn write_json_pretty<T: Serialize>(path: &Path, value: &T, stage: Stage) -> Result<()> {
    write_atomic(path, stage, |w| {
        serde_json::to_writer_pretty(&mut *w, value).map_err(|e| ExportError::encode(stage, e))
    })
}

/// Sum of the on-disk sizes of `files`
pub(crate) fn total_size(files: &[PathBuf], stage: Stage) -> Result<u64> {
    files.iter().try_fold(0u64, |acc, path| {
        let len = fs::metadata(path).map_err(|e| ExportError::io(stage, e))?.len();
        Ok(acc + len)
    })
}
