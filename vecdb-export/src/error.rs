//! Error types for vecdb-export

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Phase of a conversion run an error was raised in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Config,
    Load,
    Prepare,
    Chunk(usize),
    ManifestWrite,
    JsonWrite,
    CsvWrite,
    EmbeddingsWrite,
    KeywordsWrite,
    Verify,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Config => write!(f, "configuration"),
            Stage::Load => write!(f, "load"),
            Stage::Prepare => write!(f, "output preparation"),
            Stage::Chunk(id) => write!(f, "chunk {}", id),
            Stage::ManifestWrite => write!(f, "manifest write"),
            Stage::JsonWrite => write!(f, "json write"),
            Stage::CsvWrite => write!(f, "csv write"),
            Stage::EmbeddingsWrite => write!(f, "embeddings write"),
            Stage::KeywordsWrite => write!(f, "keywords write"),
            Stage::Verify => write!(f, "verify"),
        }
    }
}

/// Errors that can occur while loading or exporting an embedding database
#[derive(Debug, Error)]
pub enum ExportError {
    /// Input container does not exist
    #[error("Input not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Schema, shape or value mismatch; `stage` says which input was rejected
    #[error("Format error: {message}")]
    Format { stage: Stage, message: String },

    /// Filesystem failure during a stage
    #[error("IO error during {stage}: {source}")]
    Io {
        stage: Stage,
        #[source]
        source: std::io::Error,
    },

    /// Serializer or deserializer failure during a stage
    #[error("Encoding error during {stage}: {message}")]
    Encode { stage: Stage, message: String },
}

impl ExportError {
    /// Create a format error for rejected input data
    pub fn format(msg: impl Into<String>) -> Self {
        Self::format_at(Stage::Load, msg)
    }

    /// Create a format error raised outside of loading
    pub fn format_at(stage: Stage, msg: impl Into<String>) -> Self {
        Self::Format {
            stage,
            message: msg.into(),
        }
    }

    /// Create an IO error tagged with the stage it happened in
    pub fn io(stage: Stage, source: std::io::Error) -> Self {
        Self::Io { stage, source }
    }

    /// Create an encoding error tagged with the stage it happened in
    pub fn encode(stage: Stage, err: impl fmt::Display) -> Self {
        Self::Encode {
            stage,
            message: err.to_string(),
        }
    }

    /// Stage the run failed in; a missing input maps to [`Stage::Load`]
    pub fn stage(&self) -> Stage {
        match self {
            Self::NotFound(_) => Stage::Load,
            Self::Format { stage, .. } | Self::Io { stage, .. } | Self::Encode { stage, .. } => {
                *stage
            }
        }
    }
}

/// Result type for export operations
pub type Result<T> = std::result::Result<T, ExportError>;
