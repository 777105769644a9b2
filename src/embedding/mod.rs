//! Text-to-vector embedding providers.
//!
//! Two implementations of [`EmbeddingProvider`] share one output contract:
//! 128 dimensions, L2-normalized. The hash provider is deterministic and
//! always available; the ONNX model provider (e5-small-v2) is optional and
//! selection falls back to hash when its runtime is missing, so capture never
//! fails on embedder choice. Which provider produced a stored vector is
//! recorded per clip and never recomputed retroactively.

pub mod hash;
pub mod model;

use std::sync::Arc;

use anyhow::Result;
use once_cell::sync::OnceCell;

use crate::config::EmbeddingConfig;

/// Number of dimensions in the embedding vectors. Both providers emit this
/// dimensionality by design so similarity comparisons stay uniform.
pub const EMBEDDING_DIM: usize = 128;

/// Which embedding provider to use. Stored as the `embedder` setting and on
/// every clip row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedderKind {
    /// Deterministic character-trigram hashing. No external dependency.
    Hash,
    /// Local ONNX e5-small-v2 model. Requires downloaded model files.
    Model,
}

impl EmbedderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hash => "hash",
            Self::Model => "e5-small",
        }
    }
}

impl std::fmt::Display for EmbedderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EmbedderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hash" => Ok(Self::Hash),
            "e5-small" | "e5" | "model" => Ok(Self::Model),
            other => Err(format!("unknown embedder: {other}. Supported: hash, e5-small")),
        }
    }
}

/// Trait for embedding text into vectors.
///
/// Implementations produce L2-normalized vectors of exactly [`EMBEDDING_DIM`]
/// dimensions. All methods are synchronous — callers in async contexts should
/// use `tokio::task::spawn_blocking`.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text string into a vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of text strings. Implementations may override for batched inference.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Return the number of dimensions this provider produces.
    fn dimensions(&self) -> usize {
        EMBEDDING_DIM
    }

    /// Provider identifier, stored alongside every vector it produces.
    fn name(&self) -> &'static str;
}

/// Hands out the active provider per operation, honoring the `embedder`
/// setting read at call time. The ONNX session is created lazily once and
/// reused; if its model files are missing, selection fails closed to the
/// hash provider with a warning instead of erroring the capture pipeline.
pub struct ProviderRegistry {
    config: EmbeddingConfig,
    hash: Arc<hash::HashEmbedder>,
    model: OnceCell<Option<Arc<model::OnnxEmbedder>>>,
}

impl ProviderRegistry {
    pub fn new(config: EmbeddingConfig) -> Self {
        Self {
            config,
            hash: Arc::new(hash::HashEmbedder::default()),
            model: OnceCell::new(),
        }
    }

    /// Resolve the provider for `kind`, falling back to hash when the model
    /// provider cannot be constructed.
    pub fn provider(&self, kind: EmbedderKind) -> Arc<dyn EmbeddingProvider> {
        match kind {
            EmbedderKind::Hash => self.hash.clone(),
            EmbedderKind::Model => {
                let model = self.model.get_or_init(|| {
                    match model::OnnxEmbedder::new(&self.config) {
                        Ok(m) => Some(Arc::new(m)),
                        Err(e) => {
                            tracing::warn!(
                                error = %e,
                                "model embedder unavailable; falling back to hash \
                                 (run `clipvault model download` first)"
                            );
                            None
                        }
                    }
                });
                match model {
                    Some(m) => m.clone(),
                    None => self.hash.clone(),
                }
            }
        }
    }
}

/// L2-normalize a vector. Returns a zero vector if the input norm is zero.
pub(crate) fn l2_normalize(v: &[f32]) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter().map(|x| x / norm).collect()
    } else {
        v.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedder_kind_round_trips() {
        assert_eq!("hash".parse::<EmbedderKind>().unwrap(), EmbedderKind::Hash);
        assert_eq!("e5-small".parse::<EmbedderKind>().unwrap(), EmbedderKind::Model);
        assert_eq!("E5".parse::<EmbedderKind>().unwrap(), EmbedderKind::Model);
        assert!("word2vec".parse::<EmbedderKind>().is_err());
    }

    #[test]
    fn registry_falls_back_to_hash_when_model_missing() {
        let config = EmbeddingConfig {
            model: "e5-small-v2".into(),
            cache_dir: "/nonexistent/model/dir".into(),
        };
        let registry = ProviderRegistry::new(config);
        let provider = registry.provider(EmbedderKind::Model);
        // Fail-closed: capture must proceed with the hash provider
        assert_eq!(provider.name(), "hash");
        assert_eq!(provider.dimensions(), EMBEDDING_DIM);
    }

    #[test]
    fn l2_normalize_unit_norm() {
        let v = vec![3.0, 4.0];
        let normalized = l2_normalize(&v);
        assert!((normalized[0] - 0.6).abs() < 1e-6);
        assert!((normalized[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn l2_normalize_zero_vector() {
        let v = vec![0.0, 0.0, 0.0];
        assert_eq!(l2_normalize(&v), vec![0.0, 0.0, 0.0]);
    }
}
