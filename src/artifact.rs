/**
 * Index Artifact Format
 *
 * DESIGN DECISION: self-describing JSON document (header + records), mirrors
 * the teacher's own artifact/manifest structures in shape if not in content
 * WHY: byte-exact layout is explicitly not mandated by the wire protocol;
 * JSON keeps the cold-path/hot-path boundary inspectable and easy to hand-craft
 * in tests
 *
 * The `reembed_on_load` header flag resolves the open question of whether a
 * reload trusts precomputed vectors or recomputes them from source text: both
 * modes are supported, selected explicitly per artifact rather than inferred.
 */

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::pattern::{Mixin, Pattern};

/// Header describing the artifact as a whole; validated against the running
/// `EmbeddingProvider` before any record is trusted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactHeader {
    pub schema_version: u32,
    pub model_descriptor: String,
    pub vector_dim: usize,
    pub count: usize,
    /// When true, the Index Loader recomputes every embedding from
    /// `PatternRecord.pattern` via the live `EmbeddingProvider` instead of
    /// trusting `PatternRecord.vector`. Resolves the spec's open question on
    /// reload semantics: both modes exist, selected per artifact.
    #[serde(default)]
    pub reembed_on_load: bool,
}

/// Flattened, serializable mirror of [`Pattern`] plus its embedding, used on
/// the wire and in artifact files. Converted to/from `Pattern` at load time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternRecord {
    pub pattern_id: String,
    pub pattern: PatternPayload,
    pub vector: Vec<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternPayload {
    pub description: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub focus: Option<String>,
    #[serde(default)]
    pub form: Option<String>,
    #[serde(default)]
    pub mixins: Vec<Mixin>,
    pub sample_texts: Vec<String>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl PatternPayload {
    pub fn into_pattern(self, pattern_id: &str) -> crate::error::Result<Pattern> {
        let mut builder = Pattern::builder()
            .id(pattern_id)
            .description(self.description)
            .mixins(self.mixins)
            .sample_texts(self.sample_texts)
            .metadata(self.metadata);

        if let Some(domain) = self.domain {
            builder = builder.domain(domain);
        }
        if let Some(area) = self.area {
            builder = builder.area(area);
        }
        if let Some(topic) = self.topic {
            builder = builder.topic(topic);
        }
        if let Some(theme) = self.theme {
            builder = builder.theme(theme);
        }
        if let Some(focus) = self.focus {
            builder = builder.focus(focus);
        }
        if let Some(form) = self.form {
            builder = builder.form(form);
        }

        builder.build()
    }
}

/// Full artifact: header plus `count` pattern records. `count` must equal
/// `records.len()` and every record's vector dimension must equal
/// `vector_dim`; the Index Loader rejects a disagreement rather than
/// trusting either field blindly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub header: ArtifactHeader,
    pub records: Vec<PatternRecord>,
}
