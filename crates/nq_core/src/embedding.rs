//! Byte layout shared by everything that reads or writes stored embeddings:
//! D little-endian 32-bit floats, D*4 bytes total. Encoding and decoding go
//! through this module only, so two components reading the same stored value
//! observe the same bits.

use crate::{Error, Result};

/// Encode a vector for storage.
pub fn vec_to_bytes(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Decode a stored blob back into a vector of `dim` floats.
///
/// A blob of any other length is corrupt and fails loudly rather than being
/// truncated or padded.
pub fn bytes_to_vec(blob: &[u8], dim: usize) -> Result<Vec<f32>> {
    let expected = dim * 4;
    if blob.len() != expected {
        return Err(Error::CorruptData(format!(
            "embedding blob is {} bytes, expected {}",
            blob.len(),
            expected
        )));
    }
    Ok(blob
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}
