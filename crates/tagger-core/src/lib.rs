//! Core metadata model for tagger.
//!
//! This crate defines the track metadata and search request types shared by
//! every enrichment provider, the confidence scorer applied to provider
//! matches, and the filename heuristics used to recover artist/title from
//! untagged files.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod confidence;
pub mod error;
pub mod filename;
pub mod model;

pub use confidence::{calculate_confidence, ConfidenceSignals};
pub use error::{Error, Result};
pub use filename::{decompose, decompose_path, EdgeCase, ParseResult};
pub use model::{RateLimitInfo, SearchRequest, Strategy, TrackMetadata};
