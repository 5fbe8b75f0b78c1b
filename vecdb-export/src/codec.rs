//! Little-endian `f32` codec for raw embedding files.
//!
//! # Binary Format
//!
//! Consecutive 4-byte IEEE-754 little-endian floats, row-major, with no
//! header, length prefix or padding. A block of `rows` embeddings of width
//! `dim` is exactly `rows * dim * 4` bytes. The byte order is fixed here
//! rather than taken from the host.

use std::io::{self, Write};

use crate::error::{ExportError, Result, Stage};

/// Bytes per encoded value
pub const F32_BYTES: usize = std::mem::size_of::<f32>();

/// Values per write when streaming to a writer
const WRITE_BATCH: usize = 4096;

/// Encoded size of `rows` embeddings of width `dim`
pub fn encoded_len(rows: usize, dim: usize) -> usize {
    rows * dim * F32_BYTES
}

/// [`encoded_len`] for untrusted shapes; `None` on overflow
pub fn checked_encoded_len(rows: usize, dim: usize) -> Option<usize> {
    rows.checked_mul(dim)?.checked_mul(F32_BYTES)
}

/// Encode values to a new buffer
pub fn encode_f32_le(values: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(values.len() * F32_BYTES);
    for value in values {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    debug_assert_eq!(bytes.len(), values.len() * F32_BYTES);
    bytes
}

/// Stream values to a writer in fixed-size batches; returns bytes written
pub fn write_f32_le<W: Write>(writer: &mut W, values: &[f32]) -> io::Result<usize> {
    let mut buf = Vec::with_capacity(WRITE_BATCH.min(values.len()) * F32_BYTES);
    for batch in values.chunks(WRITE_BATCH) {
        buf.clear();
        for value in batch {
            buf.extend_from_slice(&value.to_le_bytes());
        }
        writer.write_all(&buf)?;
    }
    Ok(values.len() * F32_BYTES)
}

/// Decode a buffer whose length must be a multiple of 4
pub fn decode_f32_le(bytes: &[u8]) -> Result<Vec<f32>> {
    if bytes.len() % F32_BYTES != 0 {
        return Err(ExportError::format_at(
            Stage::Verify,
            format!(
                "float buffer length {} is not a multiple of {}",
                bytes.len(),
                F32_BYTES
            ),
        ));
    }

    Ok(bytes
        .chunks_exact(F32_BYTES)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_byte_layout() {
        // 1.0 = 0x3F800000, -2.0 = 0xC0000000
        let bytes = encode_f32_le(&[1.0, -2.0]);
        assert_eq!(bytes, vec![0x00, 0x00, 0x80, 0x3F, 0x00, 0x00, 0x00, 0xC0]);
    }

    #[test]
    fn test_decode_preserves_bits() {
        let values = [
            0.1f32,
            -0.0,
            f32::MIN_POSITIVE,
            f32::MAX,
            f32::INFINITY,
            1.0e-38,
        ];
        let decoded = decode_f32_le(&encode_f32_le(&values)).unwrap();
        let original_bits: Vec<u32> = values.iter().map(|v| v.to_bits()).collect();
        let decoded_bits: Vec<u32> = decoded.iter().map(|v| v.to_bits()).collect();
        assert_eq!(original_bits, decoded_bits);
    }

    #[test]
    fn test_nan_payload_preserved() {
        let nan = f32::from_bits(0x7FC0_0123);
        let decoded = decode_f32_le(&encode_f32_le(&[nan])).unwrap();
        assert_eq!(decoded[0].to_bits(), 0x7FC0_0123);
    }

    #[test]
    fn test_decode_rejects_truncated_buffer() {
        assert!(decode_f32_le(&[0, 0, 128]).is_err());
        assert!(decode_f32_le(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_streaming_matches_buffered() {
        let values: Vec<f32> = (0..10_000).map(|i| i as f32 * 0.5).collect();
        let mut out = Vec::new();
        let written = write_f32_le(&mut out, &values).unwrap();
        assert_eq!(written, encoded_len(10_000, 1));
        assert_eq!(out, encode_f32_le(&values));
    }

    #[test]
    fn test_encoded_len() {
        assert_eq!(encoded_len(2, 2), 16);
        assert_eq!(encoded_len(1, 384), 1536);
        assert_eq!(encoded_len(0, 384), 0);
    }

    #[test]
    fn test_checked_encoded_len_overflow() {
        assert_eq!(checked_encoded_len(3, 2), Some(24));
        assert_eq!(checked_encoded_len(0, usize::MAX), Some(0));
        assert_eq!(checked_encoded_len(1, 1 << 62), None);
        assert_eq!(checked_encoded_len(usize::MAX, 2), None);
    }
}
