//! Keyword embedding converter entry point
//!
//! Loads a keyword/embedding container once and writes it out in one or more
//! layouts:
//! - `export`: convert to chunked binary, JSON, CSV + binary, or all three
//! - `verify`: read a chunked export back and check it against its manifest

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vecdb_export::{
    ExportConfig, ExportError, ExportFormat, ExportSummary, Exporter, DEFAULT_CHUNK_SIZE,
};

#[derive(Parser)]
#[command(name = "vecdb-convert")]
#[command(about = "Convert keyword embedding databases to chunked binary, JSON or CSV layouts")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a container into one or more output layouts
    Export(ExportArgs),

    /// Check a chunked export against its metadata.json
    Verify {
        /// Directory holding chunk_NNN.bin files and metadata.json
        #[arg(long, short)]
        dir: PathBuf,
    },
}

#[derive(clap::Args)]
struct ExportArgs {
    /// Input container (.json, .bin/.bincode, .msgpack/.mpk)
    #[arg(long, short)]
    input: PathBuf,

    /// Output directory
    #[arg(long, short)]
    output: PathBuf,

    /// Output layout
    #[arg(long, short, value_enum, default_value_t = FormatArg::Chunked)]
    format: FormatArg,

    /// Rows per chunk for the chunked layout
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Expected embedding width; loading fails on mismatch
    #[arg(long)]
    embedding_dim: Option<usize>,

    /// Omit created_at from manifests
    #[arg(long)]
    no_timestamp: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Json,
    Chunked,
    Csv,
    Keywords,
    Flat,
    /// Chunked, JSON and CSV + binary side by side
    All,
}

impl FormatArg {
    /// Layouts to write and the directory each goes into
    fn plan(self, output: &Path) -> Vec<(ExportFormat, PathBuf)> {
        let single = |format| vec![(format, output.to_path_buf())];
        match self {
            Self::Json => single(ExportFormat::Json),
            Self::Chunked => single(ExportFormat::ChunkedBinary),
            Self::Csv => single(ExportFormat::CsvBinary),
            Self::Keywords => single(ExportFormat::KeywordList),
            Self::Flat => single(ExportFormat::FlatBinary),
            Self::All => vec![
                (ExportFormat::ChunkedBinary, output.join("chunks")),
                (ExportFormat::Json, output.to_path_buf()),
                (ExportFormat::CsvBinary, output.join("csv_binary")),
            ],
        }
    }
}

impl ExportArgs {
    fn config(&self) -> ExportConfig {
        let mut config =
            ExportConfig::new(&self.input, &self.output).with_chunk_size(self.chunk_size);
        if let Some(dim) = self.embedding_dim {
            config = config.with_embedding_dim(dim);
        }
        if self.no_timestamp {
            config = config.without_timestamp();
        }
        config
    }
}

fn main() {
    let cli = Cli::parse();

    let log_filter = if cli.verbose {
        "vecdb_convert=debug,vecdb_export=debug"
    } else {
        "vecdb_convert=info,vecdb_export=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = match cli.command {
        Command::Export(args) => run_export(&args).map(|_| ()),
        Command::Verify { dir } => run_verify(&dir),
    };

    if let Err(e) = result {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run_export(args: &ExportArgs) -> anyhow::Result<Vec<ExportSummary>> {
    let exporter = Exporter::new(args.config()).map_err(with_stage)?;

    tracing::info!("Loading database from {}", args.input.display());
    let set = exporter.load().map_err(with_stage)?;

    let plan = args.format.plan(&args.output);
    let mut summaries = Vec::with_capacity(plan.len());
    for (step, (format, dir)) in plan.iter().enumerate() {
        tracing::info!(
            "[{}/{}] Creating {} format in {}",
            step + 1,
            plan.len(),
            format,
            dir.display()
        );
        let summary = exporter.export_to(&set, *format, dir).map_err(with_stage)?;
        log_summary(&summary);
        summaries.push(summary);
    }

    tracing::info!("Conversion complete");
    Ok(summaries)
}

fn run_verify(dir: &Path) -> anyhow::Result<()> {
    let set = vecdb_export::read_chunked(dir)
        .with_context(|| format!("{} is not a valid chunked export", dir.display()))?;

    tracing::info!(
        "{} OK: {} keywords x {} dims",
        dir.display(),
        set.len(),
        set.dim()
    );
    Ok(())
}

/// Prefix the failing stage so the message says where the run stopped
fn with_stage(err: ExportError) -> anyhow::Error {
    let stage = err.stage();
    anyhow::Error::new(err).context(format!("conversion failed during {}", stage))
}

fn log_summary(summary: &ExportSummary) {
    tracing::info!("Format: {}", summary.format);
    tracing::info!("Total keywords: {}", summary.total_keywords);
    tracing::info!("Embedding dimensions: {}", summary.embedding_dimension);
    if summary.format == ExportFormat::ChunkedBinary {
        tracing::info!("Total chunks: {}", summary.num_chunks);
    }
    tracing::info!(
        "Total size: {:.2} MB across {} files",
        summary.total_bytes as f64 / (1024.0 * 1024.0),
        summary.files.len()
    );
}
