/**
 * Configuration Loader
 *
 * DESIGN DECISION: two-tier configuration (env overrides TOML file, which
 * overrides built-in defaults)
 * WHY: trimmed from the teacher's four-tier system/team/project/user
 * hierarchy — multi-tenant tiering is an explicit Non-goal here, but layered
 * override itself is ambient engineering practice the teacher always carries
 *
 * PATTERN: serde-derived config struct with `#[serde(default)]` per field,
 * same idiom as the teacher's `config::loader::AetherlightConfig`.
 */

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

fn default_model_name() -> String {
    "all-MiniLM-L6-v2".to_string()
}
fn default_vector_dim() -> usize {
    384
}
fn default_confidence_threshold() -> f64 {
    0.5
}
fn default_max_alternatives() -> u8 {
    3
}
fn default_request_timeout_ms() -> u64 {
    2000
}
fn default_max_inflight() -> usize {
    64
}
fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}
fn default_bind_port() -> u16 {
    8080
}
fn default_artifact_path() -> String {
    "patterns.artifact.json".to_string()
}

/// Runtime configuration for the classification engine. Every field has a
/// built-in default from `spec.md` §6; the file layer and environment layer
/// may each override a subset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    #[serde(default = "default_model_name")]
    pub model_name: String,
    #[serde(default = "default_vector_dim")]
    pub vector_dim: usize,
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    #[serde(default = "default_max_alternatives")]
    pub max_alternatives: u8,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_max_inflight")]
    pub max_inflight: usize,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_bind_port")]
    pub bind_port: u16,
    /// Path to the index artifact `/reload-patterns` reads by default when
    /// the request body omits `source`. Not one of `spec.md` §6's named
    /// keys; added so the reload endpoint has somewhere to read from.
    #[serde(default = "default_artifact_path")]
    pub artifact_path: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_name: default_model_name(),
            vector_dim: default_vector_dim(),
            confidence_threshold: default_confidence_threshold(),
            max_alternatives: default_max_alternatives(),
            request_timeout_ms: default_request_timeout_ms(),
            max_inflight: default_max_inflight(),
            bind_addr: default_bind_addr(),
            bind_port: default_bind_port(),
            artifact_path: default_artifact_path(),
        }
    }
}

impl EngineConfig {
    /// Load defaults, overlay a TOML file if present at `path`, then overlay
    /// recognised environment variables. Missing file is not an error (the
    /// defaults tier still applies); malformed TOML is.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = path {
            if path.exists() {
                let contents = std::fs::read_to_string(path)?;
                config = toml::from_str(&contents)
                    .map_err(|e| crate::error::Error::LoadFailure(format!("invalid config file: {e}")))?;
            }
        }

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("MODEL_NAME") {
            self.model_name = v;
        }
        if let Some(v) = env_parsed("VECTOR_DIM") {
            self.vector_dim = v;
        }
        if let Some(v) = env_parsed("CONFIDENCE_THRESHOLD") {
            self.confidence_threshold = v;
        }
        if let Some(v) = env_parsed("MAX_ALTERNATIVES") {
            self.max_alternatives = v;
        }
        if let Some(v) = env_parsed("REQUEST_TIMEOUT_MS") {
            self.request_timeout_ms = v;
        }
        if let Some(v) = env_parsed("MAX_INFLIGHT") {
            self.max_inflight = v;
        }
        if let Ok(v) = std::env::var("BIND_ADDR") {
            self.bind_addr = v;
        }
        if let Some(v) = env_parsed("BIND_PORT") {
            self.bind_port = v;
        }
        if let Ok(v) = std::env::var("ARTIFACT_PATH") {
            self.artifact_path = v;
        }
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
