//! Container loading
//!
//! The input database is a serialized container with the logical schema
//! `{keywords, embeddings, keywords_df?}`. It may be encoded as JSON,
//! bincode or MessagePack; the encoding is picked from the file extension.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dataset::{KeywordTable, KeywordVectorSet};
use crate::error::{ExportError, Result, Stage};

/// On-disk encoding of an input container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerFormat {
    Json,
    Bincode,
    MessagePack,
}

impl ContainerFormat {
    /// Detect the encoding from a path's extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "json" => Ok(Self::Json),
            "bin" | "bincode" => Ok(Self::Bincode),
            "msgpack" | "mpk" => Ok(Self::MessagePack),
            _ => Err(ExportError::format(format!(
                "unrecognized container extension for {} (expected .json, .bin, .bincode, .msgpack or .mpk)",
                path.display()
            ))),
        }
    }
}

/// Serialized shape of the input database.
///
/// Fields are optional at the serde level so that a missing field surfaces
/// as a `Format` error naming the field rather than a decoder message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Container {
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
    #[serde(default)]
    pub embeddings: Option<Vec<Vec<f32>>>,
    #[serde(default)]
    pub keywords_df: Option<KeywordTable>,
}

impl Container {
    /// Snapshot a set back into container form
    pub fn from_set(set: &KeywordVectorSet) -> Self {
        Self {
            keywords: Some(set.keywords().to_vec()),
            embeddings: Some(set.rows().map(|r| r.to_vec()).collect()),
            keywords_df: set.table().cloned(),
        }
    }

    /// Validate shape and build the in-memory set
    pub fn into_set(self, expected_dim: Option<usize>) -> Result<KeywordVectorSet> {
        let keywords = self
            .keywords
            .ok_or_else(|| ExportError::format("container is missing required field 'keywords'"))?;
        let embeddings = self.embeddings.ok_or_else(|| {
            ExportError::format("container is missing required field 'embeddings'")
        })?;

        let set = KeywordVectorSet::from_rows(keywords, embeddings, expected_dim)?;
        set.ensure_finite()?;
        match self.keywords_df {
            Some(table) => set.with_table(table),
            None => Ok(set),
        }
    }
}

/// Load and validate a keyword/embedding container
pub fn load_dataset(path: impl AsRef<Path>, expected_dim: Option<usize>) -> Result<KeywordVectorSet> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ExportError::NotFound(path.to_path_buf()));
    }

    let format = ContainerFormat::from_path(path)?;
    log::info!("Loading {:?} container from {}", format, path.display());

    let bytes = fs::read(path).map_err(|e| ExportError::io(Stage::Load, e))?;
    let container: Container = match format {
        ContainerFormat::Json => serde_json::from_slice(&bytes)
            .map_err(|e| ExportError::format(format!("invalid JSON container: {}", e)))?,
        ContainerFormat::Bincode => bincode::deserialize(&bytes)
            .map_err(|e| ExportError::format(format!("invalid bincode container: {}", e)))?,
        ContainerFormat::MessagePack => rmp_serde::from_slice(&bytes)
            .map_err(|e| ExportError::format(format!("invalid MessagePack container: {}", e)))?,
    };

    let set = container.into_set(expected_dim)?;
    log::info!(
        "Loaded {} keywords, embeddings shape ({}, {})",
        set.len(),
        set.len(),
        set.dim()
    );
    Ok(set)
}

/// Write a set as a container, encoding chosen from the extension
pub fn save_container(path: impl AsRef<Path>, set: &KeywordVectorSet) -> Result<()> {
    let path = path.as_ref();
    let container = Container::from_set(set);

    let bytes = match ContainerFormat::from_path(path)? {
        ContainerFormat::Json => {
            serde_json::to_vec(&container).map_err(|e| ExportError::encode(Stage::Load, e))?
        }
        ContainerFormat::Bincode => {
            bincode::serialize(&container).map_err(|e| ExportError::encode(Stage::Load, e))?
        }
        ContainerFormat::MessagePack => rmp_serde::to_vec_named(&container)
            .map_err(|e| ExportError::encode(Stage::Load, e))?,
    };

    fs::write(path, bytes).map_err(|e| ExportError::io(Stage::Load, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> KeywordVectorSet {
        KeywordVectorSet::from_rows(
            vec!["seo audit".into(), "link building".into()],
            vec![vec![0.25, -1.5, 3.0], vec![1e-7, 0.0, -0.0]],
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(
            ContainerFormat::from_path(Path::new("db.JSON")).unwrap(),
            ContainerFormat::Json
        );
        assert_eq!(
            ContainerFormat::from_path(Path::new("db.bincode")).unwrap(),
            ContainerFormat::Bincode
        );
        assert_eq!(
            ContainerFormat::from_path(Path::new("db.mpk")).unwrap(),
            ContainerFormat::MessagePack
        );
        assert!(ContainerFormat::from_path(Path::new("vector_database.pkl")).is_err());
    }

    #[test]
    fn test_missing_path_is_not_found() {
        let err = load_dataset("/nonexistent/vector_database.json", None).unwrap_err();
        assert!(matches!(err, ExportError::NotFound(_)));
    }

    #[test]
    fn test_json_container_loads() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("db.json");
        fs::write(
            &path,
            r#"{"keywords": ["a", "b"], "embeddings": [[0.5, 1.0], [1.5, 2.0]]}"#,
        )
        .unwrap();

        let set = load_dataset(&path, Some(2)).unwrap();
        assert_eq!(set.keywords(), &["a".to_string(), "b".to_string()]);
        assert_eq!(set.as_slice(), &[0.5, 1.0, 1.5, 2.0]);
        assert!(set.table().is_none());
    }

    #[test]
    fn test_json_container_with_table() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("db.json");
        fs::write(
            &path,
            r#"{
                "keywords": ["a"],
                "embeddings": [[0.5]],
                "keywords_df": {"columns": ["keyword", "volume"], "rows": [["a", "1200"]]}
            }"#,
        )
        .unwrap();

        let set = load_dataset(&path, None).unwrap();
        let table = set.table().unwrap();
        assert_eq!(table.columns(), &["keyword".to_string(), "volume".to_string()]);
    }

    #[test]
    fn test_missing_embeddings_field() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("db.json");
        fs::write(&path, r#"{"keywords": ["a"]}"#).unwrap();

        let err = load_dataset(&path, None).unwrap_err();
        assert!(matches!(err, ExportError::Format { .. }));
        assert!(err.to_string().contains("'embeddings'"));
    }

    #[test]
    fn test_missing_keywords_field() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("db.json");
        fs::write(&path, r#"{"embeddings": [[1.0]]}"#).unwrap();

        let err = load_dataset(&path, None).unwrap_err();
        assert!(err.to_string().contains("'keywords'"));
    }

    #[test]
    fn test_shape_mismatch_is_format_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("db.json");
        fs::write(&path, r#"{"keywords": ["a", "b"], "embeddings": [[1.0]]}"#).unwrap();

        let err = load_dataset(&path, None).unwrap_err();
        assert!(matches!(err, ExportError::Format { .. }));
    }

    #[test]
    fn test_malformed_json_is_format_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("db.json");
        fs::write(&path, "{not json").unwrap();

        let err = load_dataset(&path, None).unwrap_err();
        assert!(err.to_string().contains("invalid JSON container"));
    }

    #[test]
    fn test_non_finite_embeddings_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let set = KeywordVectorSet::new(
            vec!["a".into(), "b".into()],
            vec![0.5, 1.0, f32::NAN, 1.0],
            2,
        )
        .unwrap();

        for name in ["db.bincode", "db.msgpack"] {
            let path = temp_dir.path().join(name);
            save_container(&path, &set).unwrap();
            let err = load_dataset(&path, None).unwrap_err();
            assert!(matches!(err, ExportError::Format { .. }), "container {}", name);
            assert!(err.to_string().contains("row 1 column 0 is NaN"));
        }
    }

    #[test]
    fn test_misaligned_table_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("db.json");
        fs::write(
            &path,
            r#"{
                "keywords": ["a", "b"],
                "embeddings": [[0.5], [1.5]],
                "keywords_df": {"columns": ["keyword"], "rows": [["zzz"], ["yyy"]]}
            }"#,
        )
        .unwrap();

        let err = load_dataset(&path, None).unwrap_err();
        assert!(matches!(err, ExportError::Format { .. }));
    }

    #[test]
    fn test_bincode_and_msgpack_containers() {
        let temp_dir = TempDir::new().unwrap();
        let set = sample();

        for name in ["db.bincode", "db.msgpack", "db.json"] {
            let path = temp_dir.path().join(name);
            save_container(&path, &set).unwrap();
            let loaded = load_dataset(&path, Some(3)).unwrap();
            assert_eq!(loaded, set, "container {}", name);
        }
    }
}
