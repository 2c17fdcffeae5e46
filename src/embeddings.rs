/**
 * Embedding Provider
 *
 * DESIGN DECISION: fastembed (ONNX Runtime under the hood) for local
 * sentence embeddings, loaded once at startup
 * WHY: deterministic text -> unit vector map, safe for concurrent use, no
 * network calls on the hot path
 *
 * The preprocessing policy (lowercase, whitespace-collapse, truncation) is
 * fixed at construction and folded into `descriptor()`, so an index
 * artifact built under a different policy is rejected at load time rather
 * than silently mis-scored.
 */

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::sync::Mutex;

use crate::error::{Error, Result};

/// Maximum characters of input text considered; text is preprocessed and
/// then truncated on a character boundary before embedding.
pub const MAX_INPUT_CHARS: usize = 4096;

/// A provider that maps text to a fixed-dimensional, L2-normalised vector.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed non-empty (post-trim) text into a unit vector of `dimension()`.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Dimension of every vector this provider returns.
    fn dimension(&self) -> usize;

    /// Opaque descriptor identifying model + preprocessing policy. Index
    /// artifacts record this string; a mismatch means the artifact is
    /// incompatible with the running provider.
    fn descriptor(&self) -> &str;
}

fn preprocess(text: &str) -> Option<String> {
    let collapsed: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let collapsed = collapsed.to_lowercase();
    if collapsed.is_empty() {
        return None;
    }
    Some(collapsed.chars().take(MAX_INPUT_CHARS).collect())
}

fn normalize(mut vector: Vec<f32>) -> Vec<f32> {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
    vector
}

/// Local sentence-embedding provider backed by `fastembed`'s all-MiniLM-L6-v2
/// model (384 dimensions). The underlying `TextEmbedding` session is not
/// `Sync`, so calls are serialised behind a mutex; `fastembed` batches
/// internally and preserves input order, so this never reorders results.
pub struct FastEmbedProvider {
    model: Mutex<TextEmbedding>,
    dimension: usize,
    descriptor: String,
}

impl FastEmbedProvider {
    /// Initialise the embedding model. Downloads/caches model files on
    /// first use via `fastembed`'s cache directory.
    pub fn new() -> Result<Self> {
        let model = TextEmbedding::try_new(
            InitOptions::new(EmbeddingModel::AllMiniLML6V2).with_show_download_progress(false),
        )
        .map_err(|e| Error::EmbeddingFailure(format!("failed to load embedding model: {e}")))?;

        Ok(Self {
            model: Mutex::new(model),
            dimension: 384,
            descriptor: "all-MiniLM-L6-v2;lowercase;whitespace-collapse;trunc=4096;concat=description+samples".to_string(),
        })
    }
}

impl EmbeddingProvider for FastEmbedProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let preprocessed =
            preprocess(text).ok_or_else(|| Error::EmbeddingFailure("empty_text".to_string()))?;

        let mut model = self
            .model
            .lock()
            .map_err(|_| Error::Internal("embedding model lock poisoned".to_string()))?;

        let mut vectors = model
            .embed(vec![preprocessed], None)
            .map_err(|e| Error::EmbeddingFailure(e.to_string()))?;

        let vector = vectors
            .pop()
            .ok_or_else(|| Error::EmbeddingFailure("model returned no embedding".to_string()))?;

        Ok(normalize(vector))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn descriptor(&self) -> &str {
        &self.descriptor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preprocess_rejects_empty_and_whitespace() {
        assert!(preprocess("").is_none());
        assert!(preprocess("   \t\n  ").is_none());
    }

    #[test]
    fn preprocess_collapses_whitespace_and_lowercases() {
        assert_eq!(preprocess("  Hello   World  ").unwrap(), "hello world");
    }

    #[test]
    fn normalize_produces_unit_vector() {
        let v = normalize(vec![3.0, 4.0]);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
    }

    #[test]
    fn normalize_leaves_zero_vector_untouched() {
        let v = normalize(vec![0.0, 0.0]);
        assert_eq!(v, vec![0.0, 0.0]);
    }
}
