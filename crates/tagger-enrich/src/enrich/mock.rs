//! Scriptable provider for orchestration tests.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tagger_core::{RateLimitInfo, SearchRequest, TrackMetadata};

use crate::context::LookupContext;
use crate::enrich::provider::MetadataProvider;
use crate::error::{EnrichError, EnrichResult};

type Responder = Box<dyn Fn(&SearchRequest) -> EnrichResult<TrackMetadata> + Send + Sync>;

pub(crate) struct MockProvider {
    name: String,
    responder: Responder,
    hang: bool,
    close_error: Option<EnrichError>,
    requests: Arc<Mutex<Vec<SearchRequest>>>,
    closes: Arc<AtomicUsize>,
}

impl fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockProvider")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A result from `provider` with the given confidence and optional label.
pub(crate) fn metadata(provider: &str, confidence: f64, label: Option<&str>) -> TrackMetadata {
    let mut metadata = TrackMetadata::new("Artist", "Title", provider)
        .with_provider_id(format!("{provider}-id"))
        .with_confidence(confidence);
    metadata.label = label.map(str::to_string);
    metadata
}

impl MockProvider {
    pub(crate) fn new(
        name: &str,
        responder: impl Fn(&SearchRequest) -> EnrichResult<TrackMetadata> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.to_string(),
            responder: Box::new(responder),
            hang: false,
            close_error: None,
            requests: Arc::default(),
            closes: Arc::default(),
        }
    }

    /// Always answers with a result of the given confidence and label.
    pub(crate) fn returning(name: &str, confidence: f64, label: Option<&str>) -> Self {
        let result = metadata(name, confidence, label);
        Self::new(name, move |_| Ok(result.clone()))
    }

    /// Always fails with `error`.
    pub(crate) fn failing(name: &str, error: EnrichError) -> Self {
        Self::new(name, move |_| Err(error.clone()))
    }

    /// Never answers; only the context can end the lookup.
    pub(crate) fn hanging(name: &str) -> Self {
        let mut provider = Self::failing(name, EnrichError::NoProvider);
        provider.hang = true;
        provider
    }

    pub(crate) fn with_close_error(mut self, error: EnrichError) -> Self {
        self.close_error = Some(error);
        self
    }

    /// Shared log of every request this provider received.
    pub(crate) fn request_log(&self) -> Arc<Mutex<Vec<SearchRequest>>> {
        Arc::clone(&self.requests)
    }

    pub(crate) fn close_count(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.closes)
    }

    pub(crate) fn boxed(self) -> Box<dyn MetadataProvider> {
        Box::new(self)
    }
}

#[async_trait]
impl MetadataProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lookup_with_hints(
        &self,
        ctx: &LookupContext,
        req: &SearchRequest,
    ) -> EnrichResult<TrackMetadata> {
        self.requests.lock().unwrap().push(req.clone());
        if self.hang {
            return ctx.run(std::future::pending()).await;
        }
        ctx.check()?;
        (self.responder)(req)
    }

    fn supports_genre(&self, _genre: &str) -> bool {
        true
    }

    fn rate_limit(&self) -> RateLimitInfo {
        RateLimitInfo {
            requests_per_second: 10.0,
            burst_allowed: 10,
            requires_identifying_header: false,
            requires_api_key: false,
        }
    }

    async fn close(&self) -> EnrichResult<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        match &self.close_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}
