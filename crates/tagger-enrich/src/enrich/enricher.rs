//! Multi-provider lookup orchestration.
//!
//! The [`Enricher`] owns an ordered list of providers and consults them
//! according to the configured [`Strategy`]. Providers are always queried
//! one after another, never in parallel, so the cost of a `Best` lookup is
//! the sum of every provider's latency.
//!
//! A result *qualifies* when its confidence reaches `min_confidence` and,
//! if `require_label` is set, it carries a label. Provider failures are
//! logged and skipped; only the last one is kept for the final error.
//! Cancellation is the exception: it ends the lookup immediately.

use tagger_core::{SearchRequest, Strategy, TrackMetadata};

use crate::config::{Config, EnricherConfig};
use crate::context::LookupContext;
use crate::enrich::musicbrainz::MusicBrainzProvider;
use crate::enrich::provider::MetadataProvider;
use crate::error::{EnrichError, EnrichResult};

const SOURCE_NAME: &str = "enricher";

/// Consults metadata providers in order and picks a result.
#[derive(Debug)]
pub struct Enricher {
    providers: Vec<Box<dyn MetadataProvider>>,
    config: EnricherConfig,
}

impl Enricher {
    pub fn new(providers: Vec<Box<dyn MetadataProvider>>, config: EnricherConfig) -> Self {
        Self { providers, config }
    }

    /// Build an enricher with every built-in provider, configured from
    /// `config`.
    ///
    /// # Errors
    /// Returns an error if a provider's HTTP client cannot be created.
    pub fn from_config(config: &Config) -> EnrichResult<Self> {
        let providers: Vec<Box<dyn MetadataProvider>> = vec![Box::new(
            MusicBrainzProvider::with_settings(&config.musicbrainz)?,
        )];
        Ok(Self::new(providers, config.enricher.clone()))
    }

    /// Register another provider after the existing ones.
    pub fn add_provider(&mut self, provider: Box<dyn MetadataProvider>) {
        log::debug!("Registered provider {}", provider.name());
        self.providers.push(provider);
    }

    /// Providers in consultation order.
    pub fn providers(&self) -> &[Box<dyn MetadataProvider>] {
        &self.providers
    }

    pub fn config(&self) -> &EnricherConfig {
        &self.config
    }

    /// Look up a track from a bare artist/title pair.
    ///
    /// Uses a default request: original releases preferred, at most five
    /// candidates per provider.
    pub async fn lookup(
        &self,
        ctx: &LookupContext,
        artist: &str,
        title: &str,
    ) -> EnrichResult<TrackMetadata> {
        self.lookup_with_request(ctx, &SearchRequest::new(artist, title))
            .await
    }

    /// Look up a track using every hint in `req`.
    ///
    /// The whole lookup, across all providers, is bounded by the configured
    /// request timeout in addition to any deadline already on `ctx`.
    ///
    /// # Errors
    /// - [`EnrichError::NoProvider`] if no provider is registered.
    /// - [`EnrichError::NotFound`] if no provider produced a qualifying
    ///   result and none failed.
    /// - Otherwise the last provider error (a provider's own `NotFound`
    ///   included), or the cancellation error if `ctx` ended.
    pub async fn lookup_with_request(
        &self,
        ctx: &LookupContext,
        req: &SearchRequest,
    ) -> EnrichResult<TrackMetadata> {
        if self.providers.is_empty() {
            return Err(EnrichError::NoProvider);
        }

        let ctx = ctx.with_timeout(self.config.request_timeout);
        log::debug!(
            "Looking up '{} - {}' with strategy {}",
            req.artist,
            req.title,
            self.config.strategy
        );

        match self.config.strategy {
            Strategy::First => self.lookup_first(&ctx, req).await,
            Strategy::Best => self.lookup_best(&ctx, req).await,
            Strategy::Fallback => self.lookup_fallback(&ctx, req).await,
        }
    }

    /// Close every provider.
    ///
    /// All providers are closed even if some fail; the last failure is
    /// returned.
    pub async fn close(&self) -> EnrichResult<()> {
        let mut last_error = None;
        for provider in &self.providers {
            if let Err(e) = provider.close().await {
                log::warn!("Failed to close provider {}: {}", provider.name(), e);
                last_error = Some(e);
            }
        }
        last_error.map_or(Ok(()), Err)
    }

    fn qualifies(&self, metadata: &TrackMetadata) -> bool {
        !metadata.provider_name.is_empty()
            && metadata.confidence() >= self.config.min_confidence
            && (!self.config.require_label || metadata.has_label())
    }

    /// Return the first qualifying result, in registration order.
    async fn lookup_first(
        &self,
        ctx: &LookupContext,
        req: &SearchRequest,
    ) -> EnrichResult<TrackMetadata> {
        let mut last_error = None;

        for provider in &self.providers {
            match provider.lookup_with_hints(ctx, req).await {
                Ok(metadata) if self.qualifies(&metadata) => {
                    log::debug!(
                        "Accepted result from {} (confidence {:.2})",
                        provider.name(),
                        metadata.confidence()
                    );
                    return Ok(metadata);
                }
                Ok(metadata) => self.log_rejected(provider.as_ref(), &metadata),
                Err(e) => Self::record_failure(provider.as_ref(), e, &mut last_error)?,
            }
        }

        Err(last_error.unwrap_or_else(|| not_found(req)))
    }

    /// Query every provider and return the highest-confidence qualifying
    /// result. Ties go to the provider registered first.
    async fn lookup_best(
        &self,
        ctx: &LookupContext,
        req: &SearchRequest,
    ) -> EnrichResult<TrackMetadata> {
        let mut best: Option<TrackMetadata> = None;
        let mut last_error = None;

        for provider in &self.providers {
            match provider.lookup_with_hints(ctx, req).await {
                Ok(metadata) if self.qualifies(&metadata) => {
                    let better = best
                        .as_ref()
                        .is_none_or(|b| metadata.confidence() > b.confidence());
                    if better {
                        best = Some(metadata);
                    }
                }
                Ok(metadata) => self.log_rejected(provider.as_ref(), &metadata),
                Err(e) => Self::record_failure(provider.as_ref(), e, &mut last_error)?,
            }
        }

        match best {
            Some(metadata) => {
                log::debug!(
                    "Best result from {} (confidence {:.2})",
                    metadata.provider_name,
                    metadata.confidence()
                );
                Ok(metadata)
            }
            None => Err(last_error.unwrap_or_else(|| not_found(req))),
        }
    }

    /// First with the full request, then First again with only artist and
    /// title.
    async fn lookup_fallback(
        &self,
        ctx: &LookupContext,
        req: &SearchRequest,
    ) -> EnrichResult<TrackMetadata> {
        match self.lookup_first(ctx, req).await {
            Ok(metadata) => Ok(metadata),
            Err(e) if e.is_cancellation() => Err(e),
            Err(e) => {
                log::debug!("Full lookup failed ({}), retrying with artist and title only", e);
                self.lookup_first(ctx, &req.simplified()).await
            }
        }
    }

    fn log_rejected(&self, provider: &dyn MetadataProvider, metadata: &TrackMetadata) {
        log::debug!(
            "Rejected result from {} (named: {}, confidence {:.2}, label: {}, required: {})",
            provider.name(),
            !metadata.provider_name.is_empty(),
            metadata.confidence(),
            metadata.has_label(),
            self.config.require_label
        );
    }

    /// Remember a provider failure, or bail out on cancellation.
    fn record_failure(
        provider: &dyn MetadataProvider,
        error: EnrichError,
        last_error: &mut Option<EnrichError>,
    ) -> EnrichResult<()> {
        if error.is_cancellation() {
            return Err(error);
        }
        if error.is_not_found() {
            log::debug!("{} found nothing", provider.name());
        } else {
            log::warn!("Provider {} failed: {}", provider.name(), error);
        }
        *last_error = Some(error);
        Ok(())
    }
}

fn not_found(req: &SearchRequest) -> EnrichError {
    EnrichError::not_found(format!("{} - {}", req.artist, req.title), SOURCE_NAME)
}
