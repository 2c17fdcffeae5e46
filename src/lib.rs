/**
 * Weave Classification Engine
 *
 * DESIGN DECISION: modular architecture with one module per spec component
 * WHY: clear ownership boundaries between the embedding provider, vector
 * index, classifier, index loader, and gateway, matching the component
 * breakdown the engine is specified against
 *
 * REASONING CHAIN:
 * 1. The classification pipeline has five seams: embed, index, classify,
 *    load, and serve over the wire
 * 2. Separating these into modules enables independent testing of the
 *    vector index's top-k search without standing up an HTTP server
 * 3. `error.rs` centralizes failure modes so every component returns the
 *    same `Result<T, Error>` and the gateway has one place to map status codes
 * 4. `ArcSwap` in `classifier.rs` is the sole synchronization point; every
 *    other module is either stateless or owns private, unshared state
 *
 * # Architecture
 *
 * ```text
 * gateway -> classifier -> embeddings
 *                       -> vector_index
 * index_loader -> artifact -> vector_index -> classifier (publish)
 * ```
 */

pub mod artifact;
pub mod classifier;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod gateway;
pub mod index_loader;
pub mod pattern;
pub mod vector_index;

pub use classifier::Classifier;
pub use config::EngineConfig;
pub use embeddings::{EmbeddingProvider, FastEmbedProvider};
pub use error::{Error, Result};
pub use gateway::GatewayState;
pub use index_loader::IndexLoader;
pub use pattern::{
    ClassificationRequest, ClassificationResponse, ClassificationStatus, Mixin, Pattern,
    PatternBuilder, PatternId, PatternMatch, WeaveUnit,
};
pub use vector_index::{IndexSnapshot, PatternRow, VectorIndex};
