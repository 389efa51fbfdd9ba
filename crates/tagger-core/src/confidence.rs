//! Confidence scoring for provider matches.
//!
//! The score rewards two things: how well the matched entity agrees with
//! the query, and how complete the returned metadata is. It is a pure
//! function of its inputs.

use crate::model::TrackMetadata;

/// Awarded to any match at all.
const BASE: f64 = 0.2;
/// Both artist and title matched exactly (case-insensitive).
const EXACT_MATCH: f64 = 0.4;
/// Anything short of an exact match.
const FUZZY_MATCH: f64 = 0.2;
const HAS_LABEL: f64 = 0.2;
const HAS_RELEASE_DATE: f64 = 0.1;
const HAS_CATALOG_NUMBER: f64 = 0.1;

/// The match-quality signals the score is derived from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfidenceSignals {
    pub exact_match: bool,
    pub has_label: bool,
    /// A release date or a year is known.
    pub has_release_date: bool,
    pub has_catalog_number: bool,
}

impl ConfidenceSignals {
    /// Read the completeness signals from `metadata`.
    pub fn from_metadata(metadata: &TrackMetadata, exact_match: bool) -> Self {
        Self {
            exact_match,
            has_label: metadata.has_label(),
            has_release_date: metadata.has_release_date(),
            has_catalog_number: metadata.has_catalog_number(),
        }
    }

    /// The score in `[0.0, 1.0]`.
    pub fn score(self) -> f64 {
        let mut confidence = BASE;
        confidence += if self.exact_match {
            EXACT_MATCH
        } else {
            FUZZY_MATCH
        };
        if self.has_label {
            confidence += HAS_LABEL;
        }
        if self.has_release_date {
            confidence += HAS_RELEASE_DATE;
        }
        if self.has_catalog_number {
            confidence += HAS_CATALOG_NUMBER;
        }
        confidence.min(1.0)
    }
}

/// Score a provider result by match quality and completeness.
pub fn calculate_confidence(metadata: &TrackMetadata, exact_match: bool) -> f64 {
    ConfidenceSignals::from_metadata(metadata, exact_match).score()
}
