//! Core clip engine: classify, store, search, evict, federate.

pub mod classify;
pub mod evict;
pub mod federation;
pub mod search;
pub mod settings;
pub mod status;
pub mod store;
pub mod tags;
pub mod types;

/// Typed failures surfaced to the adapter layer. Classification rejections
/// and dedup hits are outcomes, not errors — they never appear here.
#[derive(Debug, thiserror::Error)]
pub enum ClipError {
    #[error("no clip #{0}")]
    NotFound(i64),
    /// Identical content is already live; callers record a sighting instead.
    #[error("duplicate content (existing clip #{0})")]
    DuplicateContent(i64),
    #[error("embedding failed: {0}")]
    Embedding(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Store(#[from] rusqlite::Error),
    #[error(transparent)]
    Encoding(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ClipError>;

/// Convert an f32 embedding slice to raw bytes for sqlite-vec.
pub fn embedding_to_bytes(embedding: &[f32]) -> &[u8] {
    unsafe {
        std::slice::from_raw_parts(
            embedding.as_ptr() as *const u8,
            embedding.len() * std::mem::size_of::<f32>(),
        )
    }
}

/// Decode a vector blob read back from sqlite-vec.
pub fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// Cosine similarity recovered from the L2 distance between two unit
/// vectors: |a-b|² = 2 - 2·cos(a,b).
pub fn cosine_from_l2(distance: f64) -> f64 {
    1.0 - (distance * distance) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_bytes_round_trip() {
        let v = vec![0.25f32, -1.0, 3.5, 0.0];
        let bytes = embedding_to_bytes(&v);
        assert_eq!(bytes.len(), 16);
        assert_eq!(bytes_to_embedding(bytes), v);
    }

    #[test]
    fn cosine_from_l2_bounds() {
        assert!((cosine_from_l2(0.0) - 1.0).abs() < 1e-12);
        // orthogonal unit vectors are sqrt(2) apart
        assert!(cosine_from_l2(std::f64::consts::SQRT_2).abs() < 1e-12);
        // opposite unit vectors are 2.0 apart
        assert!((cosine_from_l2(2.0) + 1.0).abs() < 1e-12);
    }
}
