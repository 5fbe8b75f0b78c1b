//! In-memory keyword/embedding collection
//!
//! A [`KeywordVectorSet`] pairs N keyword strings with an N×D matrix of `f32`
//! embeddings stored contiguously in row-major order. Shape is validated once
//! at construction; afterwards the set is read-only.

use serde::{Deserialize, Serialize};

use crate::error::{ExportError, Result};

/// Name of the column every keyword table must carry
pub const KEYWORD_COLUMN: &str = "keyword";

/// Tabular keyword metadata (`keyword` plus auxiliary columns)
///
/// Cells are kept as strings; numeric auxiliary columns are expected to be
/// rendered by the producer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl KeywordTable {
    /// Build a table, checking that every row matches the header width and
    /// that a `keyword` column exists
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let table = Self { columns, rows };
        table.validate()?;
        Ok(table)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.keyword_column().is_none() {
            return Err(ExportError::format(format!(
                "keywords_df is missing the '{}' column (columns: {:?})",
                KEYWORD_COLUMN, self.columns
            )));
        }
        if let Some((idx, row)) = self
            .rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != self.columns.len())
        {
            return Err(ExportError::format(format!(
                "keywords_df row {} has {} cells, expected {}",
                idx,
                row.len(),
                self.columns.len()
            )));
        }
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of the `keyword` column
    pub fn keyword_column(&self) -> Option<usize> {
        self.columns.iter().position(|c| c == KEYWORD_COLUMN)
    }
}

/// Ordered keywords paired positionally with a dense embedding matrix
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordVectorSet {
    keywords: Vec<String>,
    data: Vec<f32>,
    dim: usize,
    table: Option<KeywordTable>,
}

impl KeywordVectorSet {
    /// Build from a flat row-major buffer
    pub fn new(keywords: Vec<String>, data: Vec<f32>, dim: usize) -> Result<Self> {
        if !keywords.is_empty() && dim == 0 {
            return Err(ExportError::format(
                "embedding dimension must be greater than 0",
            ));
        }
        let expected = keywords.len().checked_mul(dim).ok_or_else(|| {
            ExportError::format(format!(
                "{} keywords x {} dims overflows the addressable size",
                keywords.len(),
                dim
            ))
        })?;
        if data.len() != expected {
            return Err(ExportError::format(format!(
                "embeddings hold {} values, expected {} ({} keywords x {} dims)",
                data.len(),
                expected,
                keywords.len(),
                dim
            )));
        }
        Ok(Self {
            keywords,
            data,
            dim,
            table: None,
        })
    }

    /// Build from one vector per keyword.
    ///
    /// The width is taken from `expected_dim` when given, else from the first
    /// row. Every row must have exactly that width.
    pub fn from_rows(
        keywords: Vec<String>,
        rows: Vec<Vec<f32>>,
        expected_dim: Option<usize>,
    ) -> Result<Self> {
        if rows.len() != keywords.len() {
            return Err(ExportError::format(format!(
                "embeddings have {} rows but there are {} keywords",
                rows.len(),
                keywords.len()
            )));
        }

        let dim = match (expected_dim, rows.first()) {
            (Some(dim), _) => dim,
            (None, Some(first)) => first.len(),
            (None, None) => 0,
        };

        let mut data = Vec::with_capacity(rows.len() * dim);
        for (idx, row) in rows.into_iter().enumerate() {
            if row.len() != dim {
                return Err(ExportError::format(format!(
                    "embedding row {} has {} columns, expected {}",
                    idx,
                    row.len(),
                    dim
                )));
            }
            data.extend_from_slice(&row);
        }

        Self::new(keywords, data, dim)
    }

    /// Attach a keyword table.
    ///
    /// Row `i` of the table must carry `keywords[i]` in its `keyword` column.
    pub fn with_table(mut self, table: KeywordTable) -> Result<Self> {
        table.validate()?;
        if table.len() != self.keywords.len() {
            return Err(ExportError::format(format!(
                "keywords_df has {} rows but there are {} keywords",
                table.len(),
                self.keywords.len()
            )));
        }
        let column = table.keyword_column().unwrap_or_default();
        if let Some((idx, (row, keyword))) = table
            .rows()
            .iter()
            .zip(&self.keywords)
            .enumerate()
            .find(|(_, (row, keyword))| row[column] != **keyword)
        {
            return Err(ExportError::format(format!(
                "keywords_df row {} has keyword {:?} but keywords[{}] is {:?}",
                idx, row[column], idx, keyword
            )));
        }
        self.table = Some(table);
        Ok(self)
    }

    /// Fail on the first NaN or infinite value, naming its row and column
    pub fn ensure_finite(&self) -> Result<()> {
        match self.data.iter().position(|v| !v.is_finite()) {
            None => Ok(()),
            Some(pos) => {
                let dim = self.dim.max(1);
                Err(ExportError::format(format!(
                    "embedding row {} column {} is {} (values must be finite)",
                    pos / dim,
                    pos % dim,
                    self.data[pos]
                )))
            }
        }
    }

    /// Number of keywords (N)
    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// Embedding width (D)
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn table(&self) -> Option<&KeywordTable> {
        self.table.as_ref()
    }

    /// Whole matrix, row-major
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Embedding of keyword `idx`
    pub fn row(&self, idx: usize) -> Option<&[f32]> {
        if idx >= self.len() {
            return None;
        }
        Some(&self.data[idx * self.dim..(idx + 1) * self.dim])
    }

    /// Iterate embeddings in keyword order
    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        // An empty set may have dim 0; chunks_exact panics on 0.
        self.data.chunks_exact(self.dim.max(1))
    }

    /// Rows `[start, end)` as one contiguous slice
    pub fn row_range(&self, start: usize, end: usize) -> &[f32] {
        &self.data[start * self.dim..end * self.dim]
    }
}
