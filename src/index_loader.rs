/**
 * Index Loader
 *
 * DESIGN DECISION: validate the whole artifact before constructing any part
 * of the new snapshot, then publish with a single atomic swap
 * WHY: the system must never transition through a partially-built index; a
 * rejected artifact leaves the previously published snapshot untouched
 *
 * Grounded on the teacher's reload/publish flow in `realtime_sync::server`
 * (validate-then-swap under a single synchronization point), reworked
 * around `arc_swap` instead of the teacher's channel-based notification.
 */

use std::sync::Arc;

use crate::artifact::Artifact;
use crate::classifier::Classifier;
use crate::embeddings::EmbeddingProvider;
use crate::error::{Error, Result};
use crate::vector_index::{IndexSnapshot, PatternRow, VectorIndex};

/// Tolerance for accepting a precomputed vector as unit-norm.
const NORM_EPSILON: f32 = 1e-3;

/// Builds an [`IndexSnapshot`] from an [`Artifact`] and publishes it to a
/// [`Classifier`] atomically.
pub struct IndexLoader {
    embedder: Arc<dyn EmbeddingProvider>,
}

impl IndexLoader {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { embedder }
    }

    /// Validate `artifact` and build an `IndexSnapshot`. Does not publish;
    /// callers decide when (and whether) to swap it in via `publish`.
    pub fn load_from_artifact(&self, artifact: Artifact) -> Result<IndexSnapshot> {
        let header = &artifact.header;

        if !artifact.header.reembed_on_load && header.model_descriptor != self.embedder.descriptor() {
            return Err(Error::LoadFailure(format!(
                "artifact model descriptor '{}' does not match running provider '{}'",
                header.model_descriptor,
                self.embedder.descriptor()
            )));
        }

        if header.count != artifact.records.len() {
            return Err(Error::LoadFailure(format!(
                "artifact header declares count={} but has {} records",
                header.count,
                artifact.records.len()
            )));
        }

        let mut rows = Vec::with_capacity(artifact.records.len());

        for record in artifact.records {
            let pattern = record
                .pattern
                .into_pattern(&record.pattern_id)
                .map_err(|e| Error::LoadFailure(e.to_string()))?;

            let vector = if artifact.header.reembed_on_load {
                self.embedder.embed(&pattern.embedding_source_text())?
            } else {
                if record.vector.len() != header.vector_dim {
                    return Err(Error::LoadFailure(format!(
                        "pattern '{}' vector has dimension {} but header declares {}",
                        record.pattern_id,
                        record.vector.len(),
                        header.vector_dim
                    )));
                }

                let norm: f32 = record.vector.iter().map(|x| x * x).sum::<f32>().sqrt();
                if (norm - 1.0).abs() > NORM_EPSILON {
                    return Err(Error::LoadFailure(format!(
                        "pattern '{}' vector norm {norm} is outside [1-eps, 1+eps]",
                        record.pattern_id
                    )));
                }

                record.vector
            };

            rows.push(PatternRow { pattern, vector });
        }

        let model_descriptor = if artifact.header.reembed_on_load {
            self.embedder.descriptor().to_string()
        } else {
            header.model_descriptor.clone()
        };

        VectorIndex::build(model_descriptor, rows)
    }

    /// Load and publish in one step. On failure, `classifier`'s currently
    /// published snapshot is left untouched.
    pub fn reload(&self, classifier: &Classifier, artifact: Artifact) -> Result<usize> {
        let snapshot = self.load_from_artifact(artifact)?;
        let count = snapshot.len();
        classifier.publish(snapshot);
        Ok(count)
    }
}
