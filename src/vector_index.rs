/**
 * Vector Index
 *
 * DESIGN DECISION: exhaustive, in-memory cosine scan with a bounded
 * max-heap for top-k, no persistence and no ANN approximation
 * WHY: at this scale (<=10^4-10^5 vectors) a brute-force scan is fast and
 * reproducible; approximate search would trade away the deterministic
 * ordering the engine's tests rely on
 *
 * REASONING CHAIN (grounded in the teacher's `vector_store::sqlite`
 * cosine-similarity math, reworked to drop SQLite persistence since a
 * persistent vector database is explicitly out of scope for this core):
 * 1. All vectors are unit-norm, so cosine similarity reduces to a dot product
 * 2. A single pass maintains a heap of size k: O(N log k) for k << N
 * 3. The predicate (domain filter) is evaluated before heap insertion, so
 *    filtered-out rows never cost heap maintenance
 * 4. Ties are broken by ascending `pattern_id` for deterministic ordering
 */

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::error::{Error, Result};
use crate::pattern::{Pattern, PatternId};

/// One row of an [`IndexSnapshot`]: a pattern and its unit-norm embedding.
#[derive(Debug, Clone)]
struct Row {
    pattern: Pattern,
    vector: Vec<f32>,
}

/// Immutable, internally consistent (patterns, vectors, model descriptor)
/// triple used to service queries atomically. Cheap to clone (an `Arc`
/// wrapper is what callers actually hold; see [`crate::index_loader`]).
#[derive(Debug, Clone)]
pub struct IndexSnapshot {
    model_descriptor: String,
    dimension: usize,
    rows: Vec<Row>,
    by_id: HashMap<PatternId, usize>,
}

impl IndexSnapshot {
    pub fn model_descriptor(&self) -> &str {
        &self.model_descriptor
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Hydrate a pattern by id. Fails with `UnknownPattern` if the id is
    /// absent, which should not happen under the vectors/patterns
    /// co-construction invariant.
    pub fn lookup(&self, id: &PatternId) -> Result<&Pattern> {
        self.by_id
            .get(id)
            .map(|&i| &self.rows[i].pattern)
            .ok_or_else(|| Error::UnknownPattern(id.as_str().to_string()))
    }
}

/// A single (pattern_id, vector) pair prior to index construction.
pub struct PatternRow {
    pub pattern: Pattern,
    pub vector: Vec<f32>,
}

/// Builds and searches [`IndexSnapshot`]s.
pub struct VectorIndex;

impl VectorIndex {
    /// Build a snapshot from rows. Validates uniform dimension and rejects
    /// duplicate pattern ids.
    pub fn build(model_descriptor: String, rows: Vec<PatternRow>) -> Result<IndexSnapshot> {
        let dimension = rows.first().map(|r| r.vector.len()).unwrap_or(0);

        let mut by_id = HashMap::with_capacity(rows.len());
        let mut built = Vec::with_capacity(rows.len());

        for (i, row) in rows.into_iter().enumerate() {
            if row.vector.len() != dimension {
                return Err(Error::LoadFailure(format!(
                    "pattern '{}' has vector dimension {} but index dimension is {dimension}",
                    row.pattern.id(),
                    row.vector.len()
                )));
            }

            if by_id.insert(row.pattern.id().clone(), i).is_some() {
                return Err(Error::LoadFailure(format!(
                    "duplicate pattern id '{}'",
                    row.pattern.id()
                )));
            }

            built.push(Row {
                pattern: row.pattern,
                vector: row.vector,
            });
        }

        Ok(IndexSnapshot {
            model_descriptor,
            dimension,
            rows: built,
            by_id,
        })
    }

    /// Return up to `k` rows with the largest cosine similarity to `query`
    /// that satisfy `predicate`, ordered by descending similarity, ties
    /// broken by ascending `pattern_id`.
    pub fn search(
        snapshot: &IndexSnapshot,
        query: &[f32],
        k: usize,
        predicate: Option<&dyn Fn(&PatternId) -> bool>,
    ) -> Result<Vec<(PatternId, f32)>> {
        if snapshot.is_empty() {
            return Err(Error::SearchFailure("index_empty".to_string()));
        }

        if query.len() != snapshot.dimension {
            return Err(Error::SearchFailure(format!(
                "query dimension {} does not match index dimension {}",
                query.len(),
                snapshot.dimension
            )));
        }

        if k == 0 {
            return Ok(Vec::new());
        }

        // Min-heap of size k over (similarity, pattern_id) using `Reverse`
        // ordering so the smallest-scoring row is the one evicted first.
        let mut heap: BinaryHeap<HeapEntry> = BinaryHeap::with_capacity(k + 1);

        for row in &snapshot.rows {
            if let Some(pred) = predicate {
                if !pred(row.pattern.id()) {
                    continue;
                }
            }

            let similarity = dot(query, &row.vector);
            let entry = HeapEntry {
                similarity,
                pattern_id: row.pattern.id().clone(),
            };

            if heap.len() < k {
                heap.push(entry);
            } else if let Some(worst) = heap.peek() {
                if entry.is_better_than(worst) {
                    heap.pop();
                    heap.push(entry);
                }
            }
        }

        let mut results: Vec<(PatternId, f32)> = heap
            .into_iter()
            .map(|e| (e.pattern_id, e.similarity))
            .collect();

        results.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });

        Ok(results)
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Heap entry ordered so `BinaryHeap` (a max-heap) keeps the *worst*
/// candidate on top — popping it first is what makes the heap behave as a
/// bounded min-heap over similarity.
#[derive(Debug, Clone)]
struct HeapEntry {
    similarity: f32,
    pattern_id: PatternId,
}

impl HeapEntry {
    /// True if `self` should survive over `other` when the heap is full
    /// (larger similarity wins; ties favor the lexicographically smaller id
    /// so the eventual sort's tie-break is already heap-stable).
    fn is_better_than(&self, other: &Self) -> bool {
        match self
            .similarity
            .partial_cmp(&other.similarity)
            .unwrap_or(Ordering::Equal)
        {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => self.pattern_id < other.pattern_id,
        }
    }
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.similarity == other.similarity && self.pattern_id == other.pattern_id
    }
}
impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    /// Reversed so the heap's max (the element `BinaryHeap::peek` returns)
    /// is the worst candidate currently retained.
    fn cmp(&self, other: &Self) -> Ordering {
        match other
            .similarity
            .partial_cmp(&self.similarity)
            .unwrap_or(Ordering::Equal)
        {
            Ordering::Equal => self.pattern_id.cmp(&other.pattern_id),
            ord => ord,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(id: &str) -> Pattern {
        Pattern::builder()
            .id(id)
            .description("desc")
            .sample_text("sample")
            .build()
            .unwrap()
    }

    fn row(id: &str, vector: Vec<f32>) -> PatternRow {
        PatternRow {
            pattern: pattern(id),
            vector,
        }
    }

    #[test]
    fn build_rejects_dimension_mismatch() {
        let rows = vec![row("a/b", vec![1.0, 0.0]), row("c/d", vec![1.0, 0.0, 0.0])];
        let err = VectorIndex::build("m".to_string(), rows).unwrap_err();
        assert!(matches!(err, Error::LoadFailure(_)));
    }

    #[test]
    fn build_rejects_duplicate_ids() {
        let rows = vec![row("a/b", vec![1.0, 0.0]), row("a/b", vec![0.0, 1.0])];
        let err = VectorIndex::build("m".to_string(), rows).unwrap_err();
        assert!(matches!(err, Error::LoadFailure(_)));
    }

    #[test]
    fn search_on_empty_index_fails() {
        let snapshot = VectorIndex::build("m".to_string(), vec![]).unwrap();
        let err = VectorIndex::search(&snapshot, &[1.0, 0.0], 3, None).unwrap_err();
        assert!(matches!(err, Error::SearchFailure(_)));
    }

    #[test]
    fn search_rejects_dimension_mismatch() {
        let snapshot = VectorIndex::build("m".to_string(), vec![row("a/b", vec![1.0, 0.0])]).unwrap();
        let err = VectorIndex::search(&snapshot, &[1.0, 0.0, 0.0], 1, None).unwrap_err();
        assert!(matches!(err, Error::SearchFailure(_)));
    }

    #[test]
    fn search_orders_by_descending_similarity() {
        let rows = vec![
            row("a/low", vec![1.0, 0.0]),
            row("a/high", vec![0.707_106_8, 0.707_106_8]),
            row("a/mid", vec![0.9, 0.1]),
        ];
        // query is exactly the "high" direction
        let snapshot = VectorIndex::build("m".to_string(), rows).unwrap();
        let results = VectorIndex::search(&snapshot, &[0.707_106_8, 0.707_106_8], 3, None).unwrap();

        assert_eq!(results[0].0.as_str(), "a/high");
        assert!(results[0].1 >= results[1].1);
        assert!(results[1].1 >= results[2].1);
    }

    #[test]
    fn search_breaks_ties_by_ascending_pattern_id() {
        let rows = vec![row("b/two", vec![1.0, 0.0]), row("a/one", vec![1.0, 0.0])];
        let snapshot = VectorIndex::build("m".to_string(), rows).unwrap();
        let results = VectorIndex::search(&snapshot, &[1.0, 0.0], 2, None).unwrap();

        assert_eq!(results[0].0.as_str(), "a/one");
        assert_eq!(results[1].0.as_str(), "b/two");
    }

    #[test]
    fn search_eviction_keeps_ascending_id_within_tied_group() {
        // Heap fills with B, C (tied sim 0.5) before A (sim 1.0) arrives and
        // evicts one of them; the surviving tie member must be the smaller id.
        let rows = vec![
            row("id/b", vec![0.5, 0.866_025_4]),
            row("id/c", vec![0.5, 0.866_025_4]),
            row("id/a", vec![1.0, 0.0]),
        ];
        let snapshot = VectorIndex::build("m".to_string(), rows).unwrap();
        let results = VectorIndex::search(&snapshot, &[1.0, 0.0], 2, None).unwrap();

        assert_eq!(results[0].0.as_str(), "id/a");
        assert_eq!(results[1].0.as_str(), "id/b");
    }

    #[test]
    fn search_applies_predicate_before_heap_insert() {
        let rows = vec![
            row("health/a", vec![1.0, 0.0]),
            row("sleep/b", vec![0.9, 0.1]),
        ];
        let snapshot = VectorIndex::build("m".to_string(), rows).unwrap();
        let predicate: &dyn Fn(&PatternId) -> bool = &|id| id.as_str().starts_with("health");
        let results = VectorIndex::search(&snapshot, &[1.0, 0.0], 5, Some(predicate)).unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0.as_str(), "health/a");
    }

    #[test]
    fn search_respects_k_limit() {
        let rows = vec![row("a/1", vec![1.0, 0.0]), row("a/2", vec![0.9, 0.1]), row("a/3", vec![0.8, 0.2])];
        let snapshot = VectorIndex::build("m".to_string(), rows).unwrap();
        let results = VectorIndex::search(&snapshot, &[1.0, 0.0], 2, None).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn lookup_hydrates_pattern_by_id() {
        let rows = vec![row("a/b", vec![1.0, 0.0])];
        let snapshot = VectorIndex::build("m".to_string(), rows).unwrap();
        let id = PatternId::parse("a/b").unwrap();
        assert_eq!(snapshot.lookup(&id).unwrap().id().as_str(), "a/b");
    }

    #[test]
    fn lookup_unknown_id_fails() {
        let rows = vec![row("a/b", vec![1.0, 0.0])];
        let snapshot = VectorIndex::build("m".to_string(), rows).unwrap();
        let id = PatternId::parse("x/y").unwrap();
        assert!(matches!(snapshot.lookup(&id), Err(Error::UnknownPattern(_))));
    }
}
