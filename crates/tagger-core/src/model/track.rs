use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Enriched metadata for a single track, as produced by one provider.
///
/// A provider builds this once per lookup. The orchestrator returns it to
/// the caller or discards it; results from different providers are never
/// merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub artist: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,

    /// Identifier of the matched entity at the provider (e.g. a recording MBID).
    pub provider_id: String,

    /// Display name of the provider that produced this record.
    pub provider_name: String,

    /// Match certainty in `[0.0, 1.0]`.
    #[serde(deserialize_with = "deserialize_confidence")]
    confidence: f64,

    /// Provider-specific values that have no dedicated field.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl TrackMetadata {
    #[must_use]
    pub fn new(
        artist: impl Into<String>,
        title: impl Into<String>,
        provider_name: impl Into<String>,
    ) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
            album: None,
            label: None,
            release_date: None,
            genre: None,
            catalog_number: None,
            year: None,
            provider_id: String::new(),
            provider_name: provider_name.into(),
            confidence: 0.0,
            extra: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_provider_id(mut self, provider_id: impl Into<String>) -> Self {
        self.provider_id = provider_id.into();
        self
    }

    #[must_use]
    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_release_date(mut self, date: impl Into<String>) -> Self {
        self.release_date = Some(date.into());
        self
    }

    #[must_use]
    pub fn with_catalog_number(mut self, catalog_number: impl Into<String>) -> Self {
        self.catalog_number = Some(catalog_number.into());
        self
    }

    #[must_use]
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.set_confidence(confidence);
        self
    }

    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Set the confidence, clamping it to `[0.0, 1.0]`. NaN becomes 0.0.
    pub fn set_confidence(&mut self, confidence: f64) {
        self.confidence = clamp_confidence(confidence);
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Returns `true` when a non-empty record label is present.
    pub fn has_label(&self) -> bool {
        self.label.as_deref().is_some_and(|l| !l.is_empty())
    }

    /// Returns `true` when either a non-empty release date or a year is present.
    pub fn has_release_date(&self) -> bool {
        self.release_date.as_deref().is_some_and(|d| !d.is_empty())
            || self.year.is_some_and(|y| y > 0)
    }

    pub fn has_catalog_number(&self) -> bool {
        self.catalog_number.as_deref().is_some_and(|c| !c.is_empty())
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}

fn deserialize_confidence<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    f64::deserialize(deserializer).map(clamp_confidence)
}
