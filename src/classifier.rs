/**
 * Classifier
 *
 * DESIGN DECISION: the classifier owns the published `IndexSnapshot` behind
 * an `ArcSwap`, so a reload (see `index_loader`) is a single pointer swap
 * that in-flight and future classifications observe atomically
 * WHY: no read ever blocks on a writer, and no read ever sees a
 * partially-updated index
 *
 * Implements the request pipeline end to end: preprocessing, embedding,
 * nearest-neighbor search, confidence scoring, and threshold gating.
 */

use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use uuid::Uuid;

use crate::embeddings::EmbeddingProvider;
use crate::error::{Error, Result};
use crate::pattern::{
    ClassificationRequest, ClassificationResponse, ClassificationStatus, PatternMatch,
};
use crate::vector_index::{IndexSnapshot, VectorIndex};

/// Maps cosine similarity in `[-1, 1]` to a confidence in `[0, 1]`.
///
/// `confidence = clamp((cosine + 1) / 2, 0, 1)`. Clamping only guards
/// against floating point drift just outside `[-1, 1]`; cosine similarity
/// of unit vectors is mathematically bounded there already.
fn cosine_to_confidence(cosine: f32) -> f64 {
    (((cosine as f64) + 1.0) / 2.0).clamp(0.0, 1.0)
}

/// Classifies weave units against the currently published pattern index.
pub struct Classifier {
    snapshot: ArcSwap<IndexSnapshot>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl Classifier {
    pub fn new(snapshot: IndexSnapshot, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(snapshot),
            embedder,
        }
    }

    /// Atomically publish a newly loaded snapshot. In-flight classifications
    /// continue against whichever snapshot they already loaded.
    pub fn publish(&self, snapshot: IndexSnapshot) {
        self.snapshot.store(Arc::new(snapshot));
    }

    /// Current snapshot, for `/status` reporting.
    pub fn current_snapshot(&self) -> Arc<IndexSnapshot> {
        self.snapshot.load_full()
    }

    /// Run the full classification pipeline for one request.
    pub fn classify(&self, request: &ClassificationRequest) -> Result<ClassificationResponse> {
        let started = Instant::now();
        let request_id = Uuid::new_v4();

        let snapshot = self.snapshot.load_full();
        if snapshot.is_empty() {
            return Err(Error::IndexEmpty);
        }

        let text = request.weave_unit.text.trim();
        if text.is_empty() {
            return Err(Error::EmptyText);
        }

        let max_alternatives = request.resolved_max_alternatives()?;
        let confidence_threshold = request.resolved_confidence_threshold()?;

        let query_vector = self.embedder.embed(text)?;

        // Ask for one extra candidate so the best match and its alternatives
        // come from a single search pass.
        let k = (max_alternatives as usize) + 1;

        let domain_filter = request.filter_by_domain.clone();
        let predicate: Option<Box<dyn Fn(&crate::pattern::PatternId) -> bool>> = domain_filter
            .map(|domain| -> Box<dyn Fn(&crate::pattern::PatternId) -> bool> {
                let snapshot = snapshot.clone();
                Box::new(move |id| {
                    snapshot
                        .lookup(id)
                        .map(|p| p.domain() == Some(domain.as_str()))
                        .unwrap_or(false)
                })
            });
        let predicate_ref = predicate.as_deref();

        let hits = VectorIndex::search(&snapshot, &query_vector, k, predicate_ref)?;

        if hits.is_empty() {
            return Ok(ClassificationResponse {
                request_id,
                matched: None,
                alternatives: Vec::new(),
                processing_time_ms: elapsed_ms(started),
                status: ClassificationStatus::NoMatch,
                error_message: None,
            });
        }

        let mut scored = Vec::with_capacity(hits.len());
        for (pattern_id, cosine) in &hits {
            let pattern = snapshot.lookup(pattern_id)?;
            scored.push(PatternMatch {
                pattern_id: pattern_id.as_str().to_string(),
                confidence: cosine_to_confidence(*cosine),
                metadata: pattern.metadata().clone(),
            });
        }

        let (best, rest) = scored.split_first().expect("hits is non-empty");
        let max_alternatives = max_alternatives as usize;

        if best.confidence < confidence_threshold {
            // Below threshold: keep the near-miss best alongside the rest so
            // the caller can still see what almost matched.
            let alternatives: Vec<PatternMatch> =
                scored.iter().take(max_alternatives).cloned().collect();
            return Ok(ClassificationResponse {
                request_id,
                matched: None,
                alternatives,
                processing_time_ms: elapsed_ms(started),
                status: ClassificationStatus::NoMatch,
                error_message: None,
            });
        }

        let alternatives: Vec<PatternMatch> = rest
            .iter()
            .take(max_alternatives.saturating_sub(1))
            .cloned()
            .collect();

        Ok(ClassificationResponse {
            request_id,
            matched: Some(best.clone()),
            alternatives,
            processing_time_ms: elapsed_ms(started),
            status: ClassificationStatus::Success,
            error_message: None,
        })
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
