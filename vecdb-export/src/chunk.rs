//! Chunk planning
//!
//! A set of N keywords is split into `ceil(N / chunk_size)` contiguous
//! half-open ranges. Every chunk holds `chunk_size` rows except the last,
//! which holds the remainder.

use crate::dataset::KeywordVectorSet;
use crate::error::{ExportError, Result, Stage};

/// Zero-padding of chunk file indices
pub const FILENAME_WIDTH: usize = 3;

/// Half-open row range `[start, end)` assigned to one chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSpan {
    pub chunk_id: usize,
    pub start: usize,
    pub end: usize,
}

impl ChunkSpan {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Borrowed view of one chunk's keywords and embedding rows
#[derive(Debug, Clone, Copy)]
pub struct Chunk<'a> {
    pub span: ChunkSpan,
    pub keywords: &'a [String],
    /// Row-major, `span.len() * dim` values
    pub embeddings: &'a [f32],
}

/// Number of chunks needed for `total` rows
pub fn num_chunks(total: usize, chunk_size: usize) -> usize {
    if chunk_size == 0 {
        return 0;
    }
    total.div_ceil(chunk_size)
}

/// Compute every chunk range in ascending id order
pub fn plan_chunks(total: usize, chunk_size: usize) -> Result<Vec<ChunkSpan>> {
    if chunk_size == 0 {
        return Err(ExportError::format_at(
            Stage::Config,
            "chunk_size must be greater than 0",
        ));
    }

    Ok((0..num_chunks(total, chunk_size))
        .map(|chunk_id| {
            let start = chunk_id * chunk_size;
            ChunkSpan {
                chunk_id,
                start,
                end: (start + chunk_size).min(total),
            }
        })
        .collect())
}

/// Split a set into borrowed chunk views
pub fn split(set: &KeywordVectorSet, chunk_size: usize) -> Result<Vec<Chunk<'_>>> {
    Ok(plan_chunks(set.len(), chunk_size)?
        .into_iter()
        .map(|span| Chunk {
            span,
            keywords: &set.keywords()[span.start..span.end],
            embeddings: set.row_range(span.start, span.end),
        })
        .collect())
}

/// File name of chunk `chunk_id`, e.g. `chunk_007.bin`.
///
/// Ids are padded to [`FILENAME_WIDTH`] digits whatever the chunk count, so
/// chunk 0 is always `chunk_000.bin`. Ids from 1000 up print in full.
pub fn chunk_filename(chunk_id: usize) -> String {
    format!("chunk_{:0width$}.bin", chunk_id, width = FILENAME_WIDTH)
}
