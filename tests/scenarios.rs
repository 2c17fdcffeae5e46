/**
 * End-to-end classification scenarios
 *
 * DESIGN DECISION: a tiny, hand-built catalogue (`P1`, `P2`, `P3`) with a
 * deterministic stub embedder mapping known literal inputs to known vectors
 * WHY: lets every scenario assert exact confidence values instead of
 * tolerances, and keeps the scenarios independent of any real embedding model
 */

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

use pretty_assertions::assert_eq;
use weave_classifier::{
    ClassificationRequest, ClassificationStatus, Classifier, EmbeddingProvider, Pattern,
    PatternRow, Result, VectorIndex, WeaveUnit,
};

const P1: &str = "child_development/sleep/nap/crib/early_am";
const P2: &str = "child_development/sleep/nap/crib/afternoon";
const P3: &str = "health/meals/lunch/outdoor/picnic";

struct StubEmbedder {
    table: HashMap<String, Vec<f32>>,
}

impl EmbeddingProvider for StubEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.table
            .get(text)
            .cloned()
            .ok_or_else(|| weave_classifier::Error::EmbeddingFailure(format!("no stub vector for '{text}'")))
    }

    fn dimension(&self) -> usize {
        3
    }

    fn descriptor(&self) -> &str {
        "scenario-stub"
    }
}

fn build_catalogue_classifier() -> (Classifier, Arc<dyn EmbeddingProvider>) {
    let v1 = vec![1.0, 0.0, 0.0];
    let v2 = vec![0.9, 0.435_89, 0.0];
    let v3 = vec![0.0, 0.0, 1.0];

    let mut table = HashMap::new();
    table.insert("She took an early morning nap in her crib".to_string(), v1.clone());
    table.insert("We had a picnic lunch by the lake".to_string(), v3.clone());
    table.insert("asdf qwerty zxcv".to_string(), vec![-0.577_35, -0.577_35, -0.577_35]);

    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(StubEmbedder { table });

    let rows = vec![
        PatternRow {
            pattern: Pattern::builder()
                .id(P1)
                .description("Early morning nap in the crib")
                .domain("child_development")
                .sample_text("She napped in her crib before breakfast")
                .build()
                .unwrap(),
            vector: v1,
        },
        PatternRow {
            pattern: Pattern::builder()
                .id(P2)
                .description("Afternoon nap in the crib")
                .domain("child_development")
                .sample_text("She napped in her crib after lunch")
                .build()
                .unwrap(),
            vector: v2,
        },
        PatternRow {
            pattern: Pattern::builder()
                .id(P3)
                .description("Outdoor picnic lunch")
                .domain("health")
                .sample_text("They had a picnic lunch outdoors")
                .build()
                .unwrap(),
            vector: v3,
        },
    ];

    let snapshot = VectorIndex::build("scenario-stub".to_string(), rows).unwrap();
    (Classifier::new(snapshot, embedder.clone()), embedder)
}

fn request(text: &str, max_alternatives: u8, confidence_threshold: f64) -> ClassificationRequest {
    ClassificationRequest {
        weave_unit: WeaveUnit {
            id: uuid::Uuid::new_v4(),
            text: text.to_string(),
            metadata: None,
            timestamp: None,
        },
        max_alternatives: Some(max_alternatives),
        confidence_threshold: Some(confidence_threshold),
        filter_by_domain: None,
    }
}

#[test]
fn s1_exact_nap_match_ranks_p1_over_p2() {
    let (classifier, _embedder) = build_catalogue_classifier();
    let response = classifier
        .classify(&request("She took an early morning nap in her crib", 2, 0.3))
        .unwrap();

    assert_eq!(response.status, ClassificationStatus::Success);
    let matched = response.matched.as_ref().unwrap();
    assert_eq!(matched.pattern_id, P1);
    assert!(matched.confidence >= 0.7);
    assert_eq!(response.alternatives[0].pattern_id, P2);
}

#[test]
fn s2_picnic_match_excludes_p3_from_alternatives() {
    let (classifier, _embedder) = build_catalogue_classifier();
    let response = classifier
        .classify(&request("We had a picnic lunch by the lake", 3, 0.3))
        .unwrap();

    assert_eq!(response.status, ClassificationStatus::Success);
    let matched = response.matched.as_ref().unwrap();
    assert_eq!(matched.pattern_id, P3);
    assert!(response.alternatives.iter().all(|alt| alt.pattern_id != P3));
}

#[test]
fn s3_nonsense_input_is_no_match_with_alternatives() {
    let (classifier, _embedder) = build_catalogue_classifier();
    let response = classifier
        .classify(&request("asdf qwerty zxcv", 3, 0.9))
        .unwrap();

    assert_eq!(response.status, ClassificationStatus::NoMatch);
    assert!(response.matched.is_none());
    assert!(!response.alternatives.is_empty());
}

#[test]
fn s4_domain_filter_excludes_non_health_patterns() {
    let (classifier, _embedder) = build_catalogue_classifier();
    let mut req = request("She took an early morning nap in her crib", 2, 0.3);
    req.filter_by_domain = Some("health".to_string());

    let response = classifier.classify(&req).unwrap();

    if let Some(matched) = &response.matched {
        assert_eq!(matched.pattern_id, P3);
    }
    assert!(response.alternatives.iter().all(|alt| alt.pattern_id != P1 && alt.pattern_id != P2));
}

#[test]
fn s5_empty_catalogue_reports_index_empty() {
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(StubEmbedder {
        table: HashMap::new(),
    });
    let snapshot = VectorIndex::build("scenario-stub".to_string(), vec![]).unwrap();
    let classifier = Classifier::new(snapshot, embedder);

    let err = classifier
        .classify(&request("anything", 3, 0.5))
        .unwrap_err();

    assert_eq!(err.code(), "index_empty");
    assert_eq!(err.status_code(), 503);
}

#[test]
fn s6_concurrent_classify_and_reload_never_observes_partial_index() {
    let (classifier, embedder) = build_catalogue_classifier();
    let classifier = Arc::new(classifier);

    let reload_handle = {
        let classifier = classifier.clone();
        let embedder = embedder.clone();
        thread::spawn(move || {
            for _ in 0..50 {
                let v1 = vec![1.0, 0.0, 0.0];
                let rows = vec![PatternRow {
                    pattern: Pattern::builder()
                        .id(P1)
                        .description("Early morning nap in the crib")
                        .domain("child_development")
                        .sample_text("She napped in her crib before breakfast")
                        .build()
                        .unwrap(),
                    vector: v1,
                }];
                let snapshot = VectorIndex::build(embedder.descriptor().to_string(), rows).unwrap();
                classifier.publish(snapshot);
            }
        })
    };

    let mut query_handles = Vec::new();
    for _ in 0..4 {
        let classifier = classifier.clone();
        query_handles.push(thread::spawn(move || {
            for _ in 0..250 {
                let response = classifier.classify(&request(
                    "She took an early morning nap in her crib",
                    2,
                    0.3,
                ));
                match response {
                    Ok(resp) => {
                        // Well-formed regardless of which snapshot served it:
                        // either the 3-pattern or 1-pattern catalogue.
                        assert!(resp.alternatives.len() <= 2);
                        if let Some(matched) = resp.matched {
                            assert_eq!(matched.pattern_id, P1);
                        }
                    }
                    Err(err) => panic!("unexpected error during concurrent reload: {err}"),
                }
            }
        }));
    }

    reload_handle.join().unwrap();
    for handle in query_handles {
        handle.join().unwrap();
    }
}
