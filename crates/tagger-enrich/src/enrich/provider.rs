//! The capability every metadata source implements.

use std::fmt;

use async_trait::async_trait;
use tagger_core::{RateLimitInfo, SearchRequest, TrackMetadata};

use crate::context::LookupContext;
use crate::error::EnrichResult;

/// A source of track metadata (MusicBrainz, Discogs, a local database...).
///
/// Implementations must be shareable across tasks. The [`Enricher`] only
/// ever talks to providers through this trait.
///
/// [`Enricher`]: crate::enrich::enricher::Enricher
#[async_trait]
pub trait MetadataProvider: Send + Sync + fmt::Debug {
    /// Display name, also written to [`TrackMetadata::provider_name`].
    fn name(&self) -> &str;

    /// Look up a track from a bare artist/title pair.
    async fn lookup(
        &self,
        ctx: &LookupContext,
        artist: &str,
        title: &str,
    ) -> EnrichResult<TrackMetadata> {
        self.lookup_with_hints(ctx, &SearchRequest::new(artist, title))
            .await
    }

    /// Look up a track using every hint in `req`.
    ///
    /// # Errors
    /// Returns [`EnrichError::NotFound`] when nothing matches,
    /// [`EnrichError::Api`] on remote failure, and the context's
    /// cancellation error if `ctx` ends first.
    ///
    /// [`EnrichError::NotFound`]: crate::error::EnrichError::NotFound
    /// [`EnrichError::Api`]: crate::error::EnrichError::Api
    async fn lookup_with_hints(
        &self,
        ctx: &LookupContext,
        req: &SearchRequest,
    ) -> EnrichResult<TrackMetadata>;

    /// Whether this provider has useful coverage of `genre`.
    fn supports_genre(&self, genre: &str) -> bool;

    /// The limits this provider honours against its upstream.
    fn rate_limit(&self) -> RateLimitInfo;

    /// Release resources. Idempotent, and safe on a provider never used.
    async fn close(&self) -> EnrichResult<()> {
        Ok(())
    }
}
