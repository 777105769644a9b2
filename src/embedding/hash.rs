//! Deterministic hash embedder.
//!
//! Hashes overlapping character trigrams of the lowercased text into
//! [`EMBEDDING_DIM`] buckets, accumulating a count per bucket, then
//! L2-normalizes. Stateless and deterministic across processes, so vectors
//! stored on one machine compare correctly against queries from another.

use anyhow::Result;

use super::{l2_normalize, EmbeddingProvider, EMBEDDING_DIM};

/// Character n-gram width.
const NGRAM: usize = 3;

#[derive(Debug, Default)]
pub struct HashEmbedder;

impl EmbeddingProvider for HashEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(hash_embed(text, EMBEDDING_DIM))
    }

    fn name(&self) -> &'static str {
        "hash"
    }
}

/// Bucket-count embedding over overlapping character trigrams.
fn hash_embed(text: &str, dim: usize) -> Vec<f32> {
    let mut vec = vec![0.0f32; dim];
    let chars: Vec<char> = text.to_lowercase().chars().collect();
    if chars.is_empty() {
        return vec;
    }

    if chars.len() < NGRAM {
        // Short inputs still get a vector: hash the whole text once.
        let gram: String = chars.iter().collect();
        vec[(fnv1a(gram.as_bytes()) % dim as u64) as usize] += 1.0;
    } else {
        let mut buf = String::with_capacity(NGRAM * 4);
        for window in chars.windows(NGRAM) {
            buf.clear();
            buf.extend(window);
            vec[(fnv1a(buf.as_bytes()) % dim as u64) as usize] += 1.0;
        }
    }

    l2_normalize(&vec)
}

/// FNV-1a 64-bit. Stable across platforms, unlike the stdlib's DefaultHasher.
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn embed_has_fixed_dim_and_unit_norm() {
        let emb = HashEmbedder.embed("the quick brown fox").unwrap();
        assert_eq!(emb.len(), EMBEDDING_DIM);
        assert!((norm(&emb) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn embed_is_deterministic() {
        let a = HashEmbedder.embed("same input twice").unwrap();
        let b = HashEmbedder.embed("same input twice").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn identical_text_has_similarity_one() {
        let a = HashEmbedder.embed("hello world").unwrap();
        let b = HashEmbedder.embed("hello world").unwrap();
        assert!((cosine(&a, &b) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn overlapping_text_scores_higher_than_disjoint() {
        let base = HashEmbedder.embed("rust borrow checker errors").unwrap();
        let close = HashEmbedder.embed("rust borrow checker").unwrap();
        let far = HashEmbedder.embed("quarterly budget spreadsheet").unwrap();
        assert!(cosine(&base, &close) > cosine(&base, &far));
    }

    #[test]
    fn case_is_folded() {
        let a = HashEmbedder.embed("Hello World").unwrap();
        let b = HashEmbedder.embed("hello world").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_text_gives_zero_vector() {
        let emb = HashEmbedder.embed("").unwrap();
        assert_eq!(emb.len(), EMBEDDING_DIM);
        assert!(norm(&emb) < 1e-9);
    }

    #[test]
    fn short_text_still_embeds() {
        let emb = HashEmbedder.embed("ab").unwrap();
        assert!((norm(&emb) - 1.0).abs() < 1e-5);
    }
}
