//! Export configuration

use std::path::PathBuf;

use crate::error::{ExportError, Result, Stage};

/// Rows per chunk when none is configured
pub const DEFAULT_CHUNK_SIZE: usize = 2000;

/// Configuration for a single conversion run
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Serialized container to read
    pub input_path: PathBuf,
    /// Directory all output files are written into
    pub output_dir: PathBuf,
    /// Rows per chunk for the chunked binary layout (default: 2000)
    pub chunk_size: usize,
    /// Expected embedding width; `None` accepts whatever the container holds
    pub embedding_dim: Option<usize>,
    /// Stamp manifests with `created_at` (default: true)
    pub include_timestamp: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("vector_database.json"),
            output_dir: PathBuf::from("vector_database_export"),
            chunk_size: DEFAULT_CHUNK_SIZE,
            embedding_dim: None,
            include_timestamp: true,
        }
    }
}

impl ExportConfig {
    /// Config for the given input and output with every other option defaulted
    pub fn new(input_path: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_embedding_dim(mut self, dim: usize) -> Self {
        self.embedding_dim = Some(dim);
        self
    }

    pub fn without_timestamp(mut self) -> Self {
        self.include_timestamp = false;
        self
    }

    /// Reject settings no export can run with
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(ExportError::format_at(
                Stage::Config,
                "chunk_size must be greater than 0",
            ));
        }
        if self.embedding_dim == Some(0) {
            return Err(ExportError::format_at(
                Stage::Config,
                "embedding_dim must be greater than 0",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExportConfig::default();
        assert_eq!(config.chunk_size, 2000);
        assert_eq!(config.embedding_dim, None);
        assert!(config.include_timestamp);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_overrides() {
        let config = ExportConfig::new("in.json", "out")
            .with_chunk_size(8000)
            .with_embedding_dim(384)
            .without_timestamp();
        assert_eq!(config.input_path, PathBuf::from("in.json"));
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.chunk_size, 8000);
        assert_eq!(config.embedding_dim, Some(384));
        assert!(!config.include_timestamp);
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let config = ExportConfig::default().with_chunk_size(0);
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ExportError::Format { .. }));
        assert_eq!(err.stage(), Stage::Config);
    }

    #[test]
    fn test_zero_dim_rejected() {
        let config = ExportConfig::default().with_embedding_dim(0);
        assert!(config.validate().is_err());
    }
}
