/**
 * Pattern & Request Data Model
 *
 * DESIGN DECISION: Immutable, builder-constructed pattern records
 * WHY: Patterns are read-only after the cold path builds them; immutability
 * lets an `IndexSnapshot` share them across concurrent queries without locks
 *
 * PATTERN: builder construction with validation at `build()` time, same
 * idiom the teacher crate uses for its own `Pattern` type
 *
 * # Hierarchy
 *
 * A `PatternId` is a slash-delimited path of 2-6 segments, e.g.
 * `child_development/sleep/nap/crib/early_am/single_entry`. Segments are
 * never empty and the id is case-sensitive.
 */

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

use crate::error::{Error, Result};

const MIN_SEGMENTS: usize = 2;
const MAX_SEGMENTS: usize = 6;

/// Slash-delimited, 2-6 segment pattern identity. Stable, case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatternId(String);

impl PatternId {
    /// Parse and validate a pattern id from its slash-delimited string form.
    pub fn parse(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let segments: Vec<&str> = raw.split('/').collect();

        if segments.len() < MIN_SEGMENTS || segments.len() > MAX_SEGMENTS {
            return Err(Error::InputInvalid(format!(
                "pattern id '{raw}' must have {MIN_SEGMENTS}-{MAX_SEGMENTS} segments, got {}",
                segments.len()
            )));
        }

        if segments.iter().any(|s| s.is_empty()) {
            return Err(Error::InputInvalid(format!(
                "pattern id '{raw}' contains an empty segment"
            )));
        }

        Ok(Self(raw))
    }

    /// Borrow the id as its slash-delimited string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The segments of the hierarchy, in order (area/topic/theme/focus/form/...).
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

impl fmt::Display for PatternId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Domain tag attached to a pattern (time, emotion, location, person,
/// activity, health, development).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mixin {
    Time,
    Emotion,
    Location,
    Person,
    Activity,
    Health,
    Development,
}

/// A single named, hierarchically-identified concept in the taxonomy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    id: PatternId,
    description: String,
    domain: Option<String>,
    area: Option<String>,
    topic: Option<String>,
    theme: Option<String>,
    focus: Option<String>,
    form: Option<String>,
    mixins: Vec<Mixin>,
    sample_texts: Vec<String>,
    #[serde(default)]
    metadata: HashMap<String, serde_json::Value>,
}

impl Pattern {
    /// Start building a pattern. `id`, `description`, and at least one
    /// sample text are required for `build()` to succeed.
    pub fn builder() -> PatternBuilder {
        PatternBuilder::default()
    }

    pub fn id(&self) -> &PatternId {
        &self.id
    }
    pub fn description(&self) -> &str {
        &self.description
    }
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }
    pub fn area(&self) -> Option<&str> {
        self.area.as_deref()
    }
    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }
    pub fn theme(&self) -> Option<&str> {
        self.theme.as_deref()
    }
    pub fn focus(&self) -> Option<&str> {
        self.focus.as_deref()
    }
    pub fn form(&self) -> Option<&str> {
        self.form.as_deref()
    }
    pub fn mixins(&self) -> &[Mixin] {
        &self.mixins
    }
    pub fn sample_texts(&self) -> &[String] {
        &self.sample_texts
    }
    pub fn metadata(&self) -> &HashMap<String, serde_json::Value> {
        &self.metadata
    }

    /// The text the index-build policy embeds: description concatenated
    /// with the sample texts, in order. This policy is fixed and must
    /// match whatever the `EmbeddingProvider::descriptor()` records.
    pub fn embedding_source_text(&self) -> String {
        let mut text = self.description.clone();
        for sample in &self.sample_texts {
            text.push('\n');
            text.push_str(sample);
        }
        text
    }
}

/// Builder for [`Pattern`], validating the structural invariants from the
/// data model (non-empty id, 2-6 hierarchy segments, >=1 sample text).
#[derive(Default)]
pub struct PatternBuilder {
    id: Option<String>,
    description: Option<String>,
    domain: Option<String>,
    area: Option<String>,
    topic: Option<String>,
    theme: Option<String>,
    focus: Option<String>,
    form: Option<String>,
    mixins: Vec<Mixin>,
    sample_texts: Vec<String>,
    metadata: HashMap<String, serde_json::Value>,
}

impl PatternBuilder {
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn area(mut self, area: impl Into<String>) -> Self {
        self.area = Some(area.into());
        self
    }

    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = Some(theme.into());
        self
    }

    pub fn focus(mut self, focus: impl Into<String>) -> Self {
        self.focus = Some(focus.into());
        self
    }

    pub fn form(mut self, form: impl Into<String>) -> Self {
        self.form = Some(form.into());
        self
    }

    pub fn mixins(mut self, mixins: Vec<Mixin>) -> Self {
        self.mixins = mixins;
        self
    }

    pub fn sample_text(mut self, text: impl Into<String>) -> Self {
        self.sample_texts.push(text.into());
        self
    }

    pub fn sample_texts(mut self, texts: Vec<String>) -> Self {
        self.sample_texts = texts;
        self
    }

    pub fn metadata(mut self, metadata: HashMap<String, serde_json::Value>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn build(self) -> Result<Pattern> {
        let id = PatternId::parse(
            self.id
                .ok_or_else(|| Error::InputInvalid("pattern id is required".to_string()))?,
        )?;

        let description = self
            .description
            .ok_or_else(|| Error::InputInvalid("pattern description is required".to_string()))?;
        if description.trim().is_empty() {
            return Err(Error::InputInvalid("pattern description cannot be empty".to_string()));
        }

        if self.sample_texts.is_empty() {
            return Err(Error::InputInvalid(
                "pattern must have at least one sample text".to_string(),
            ));
        }

        Ok(Pattern {
            id,
            description,
            domain: self.domain,
            area: self.area,
            topic: self.topic,
            theme: self.theme,
            focus: self.focus,
            form: self.form,
            mixins: self.mixins,
            sample_texts: self.sample_texts,
            metadata: self.metadata,
        })
    }
}

/// A single input observation submitted for classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeaveUnit {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub text: String,
    #[serde(default)]
    pub metadata: Option<HashMap<String, serde_json::Value>>,
    #[serde(default)]
    pub timestamp: Option<chrono::DateTime<chrono::Utc>>,
}

/// Incoming classification request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationRequest {
    pub weave_unit: WeaveUnit,
    #[serde(default)]
    pub max_alternatives: Option<u8>,
    #[serde(default)]
    pub confidence_threshold: Option<f64>,
    #[serde(default)]
    pub filter_by_domain: Option<String>,
}

impl ClassificationRequest {
    pub const DEFAULT_MAX_ALTERNATIVES: u8 = 3;
    pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.5;

    /// Resolve `max_alternatives`, validating it falls in `[1, 10]`.
    pub fn resolved_max_alternatives(&self) -> Result<u8> {
        let value = self.max_alternatives.unwrap_or(Self::DEFAULT_MAX_ALTERNATIVES);
        if !(1..=10).contains(&value) {
            return Err(Error::InputInvalid(format!(
                "maxAlternatives must be in [1,10], got {value}"
            )));
        }
        Ok(value)
    }

    /// Resolve `confidence_threshold`, validating it falls in `[0, 1]`.
    pub fn resolved_confidence_threshold(&self) -> Result<f64> {
        let value = self
            .confidence_threshold
            .unwrap_or(Self::DEFAULT_CONFIDENCE_THRESHOLD);
        if !(0.0..=1.0).contains(&value) {
            return Err(Error::InputInvalid(format!(
                "confidenceThreshold must be in [0,1], got {value}"
            )));
        }
        Ok(value)
    }
}

/// A pattern match hydrated with catalogue metadata, ready for the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PatternMatch {
    pub pattern_id: String,
    pub confidence: f64,
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Overall outcome of a classification request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationStatus {
    Success,
    NoMatch,
    Error,
}

/// Response returned by the classifier, mirrored onto the wire by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResponse {
    pub request_id: Uuid,
    #[serde(rename = "match")]
    pub matched: Option<PatternMatch>,
    pub alternatives: Vec<PatternMatch>,
    pub processing_time_ms: f64,
    pub status: ClassificationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}
