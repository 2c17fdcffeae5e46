/**
 * Weave Engine entrypoint
 *
 * DESIGN DECISION: single binary wiring config -> embedder -> empty index ->
 * classifier -> gateway, same shape as the teacher's own service binaries
 * WHY: the engine starts in the `Empty` snapshot state from the spec's
 * gateway state machine; a real deployment issues `/reload-patterns` (or an
 * out-of-band artifact load) before serving traffic
 */

use std::sync::Arc;

use weave_classifier::classifier::Classifier;
use weave_classifier::config::EngineConfig;
use weave_classifier::embeddings::{EmbeddingProvider, FastEmbedProvider};
use weave_classifier::gateway::{self, GatewayState};
use weave_classifier::index_loader::IndexLoader;
use weave_classifier::vector_index::VectorIndex;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config_path = std::env::var("WEAVE_CONFIG_PATH")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| std::path::PathBuf::from("weave-engine.toml"));

    let config = EngineConfig::load(Some(&config_path))
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    tracing::info!(?config, "loaded engine configuration");

    let embedder = Arc::new(
        FastEmbedProvider::new()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?,
    );

    // Start with an empty snapshot; the gateway's /reload-patterns endpoint
    // (or an out-of-band loader invocation) publishes the real catalogue.
    let empty_snapshot = VectorIndex::build(embedder.descriptor().to_string(), Vec::new())
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    let classifier = Classifier::new(empty_snapshot, embedder.clone());
    let loader = IndexLoader::new(embedder);
    let state = Arc::new(GatewayState::new(classifier, loader, config));

    gateway::run(state).await
}
