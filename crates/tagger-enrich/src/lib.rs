//! Metadata enrichment for tagger.
//!
//! Looks up missing track metadata (label, release date, catalog number)
//! from online sources. An [`Enricher`] consults one or more
//! [`MetadataProvider`]s under a configurable strategy; [`MusicBrainzProvider`]
//! is the built-in provider. The [`batch`] module classifies whole
//! collections and feeds the files that need it through the enricher.
//!
//! Every lookup takes a [`LookupContext`] through which the caller can
//! cancel it or bound it with a deadline.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod batch;
pub mod config;
pub mod context;
pub mod enrich;
pub mod error;
pub mod musicbrainz;

pub use batch::{
    is_resource_fork, BatchProcessor, BatchSummary, EdgeCaseReport, EmbeddedTags, FileOutcome,
    FileStatus, TagReader,
};
pub use config::{Config, EnricherConfig, MusicBrainzSettings};
pub use context::LookupContext;
pub use enrich::enricher::Enricher;
pub use enrich::musicbrainz::MusicBrainzProvider;
pub use enrich::provider::MetadataProvider;
pub use enrich::resilience::RateLimiter;
pub use error::{EnrichError, EnrichResult};
pub use musicbrainz::MusicBrainzClient;
