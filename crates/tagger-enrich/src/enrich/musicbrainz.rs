//! MusicBrainz metadata provider.
//!
//! A lookup is a two-step conversation with the MusicBrainz API: a
//! structured recording search to find the best candidate, then a recording
//! lookup to get its releases and labels. Each call waits on the provider's
//! [`RateLimiter`] first (1 req/sec, as MusicBrainz requires), so one lookup
//! costs at least one interval of wall-clock time.

use async_trait::async_trait;
use tagger_core::{calculate_confidence, RateLimitInfo, SearchRequest, TrackMetadata};

use crate::config::MusicBrainzSettings;
use crate::context::LookupContext;
use crate::enrich::provider::MetadataProvider;
use crate::enrich::resilience::RateLimiter;
use crate::error::{EnrichError, EnrichResult};
use crate::musicbrainz::{MbRecording, MbRelease, MusicBrainzClient, SOURCE_NAME};

/// Bonus added to the remote score for each exactly matching field.
const EXACT_FIELD_BONUS: i64 = 10;

/// A search candidate together with the score it was selected on.
#[derive(Debug, Clone, Copy)]
pub struct ScoredRecording<'a> {
    pub recording: &'a MbRecording,
    /// Remote relevance plus local exact-match bonuses.
    pub score: i64,
    /// Both the title and a credited artist matched the request exactly.
    pub exact_match: bool,
}

/// Pick the best search candidate for `req`.
///
/// Each candidate scores its remote relevance, +10 if the title equals the
/// requested title, and +10 if any credited artist equals the requested
/// artist (both case-insensitive). The highest score wins; on a tie the
/// earlier candidate is kept.
pub fn find_best_recording<'a>(
    recordings: &'a [MbRecording],
    req: &SearchRequest,
) -> Option<ScoredRecording<'a>> {
    let mut best: Option<ScoredRecording<'a>> = None;

    for recording in recordings {
        let title_match = recording.has_title(&req.title);
        let artist_match = recording.credits_artist(&req.artist);

        let mut score = recording.score;
        if title_match {
            score += EXACT_FIELD_BONUS;
        }
        if artist_match {
            score += EXACT_FIELD_BONUS;
        }

        if best.is_none_or(|b| score > b.score) {
            best = Some(ScoredRecording {
                recording,
                score,
                exact_match: title_match && artist_match,
            });
        }
    }

    best
}

/// Pick the release to report for a recording.
///
/// When `prefer_original` is set, the release with the earliest non-empty
/// date is chosen (ISO dates compare correctly as strings, partial dates
/// included). Without a preference, or when no release carries a date, the
/// first release is returned.
pub fn find_best_release(releases: &[MbRelease], prefer_original: bool) -> Option<&MbRelease> {
    if prefer_original {
        let earliest = releases
            .iter()
            .filter_map(|r| r.date().map(|d| (d, r)))
            .min_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, r)| r);
        if earliest.is_some() {
            return earliest;
        }
    }
    releases.first()
}

/// Map the selected recording and release onto [`TrackMetadata`].
///
/// Artist and title are echoed from the request rather than taken from
/// MusicBrainz, so the caller's spelling is preserved.
pub fn to_track_metadata(
    candidate: &ScoredRecording<'_>,
    release: &MbRelease,
    req: &SearchRequest,
) -> TrackMetadata {
    let recording = candidate.recording;

    let mut metadata = TrackMetadata::new(&req.artist, &req.title, SOURCE_NAME)
        .with_provider_id(&recording.id)
        .with_album(&release.title)
        .with_extra("musicbrainz_recording_id", serde_json::json!(recording.id))
        .with_extra("musicbrainz_release_id", serde_json::json!(release.id))
        .with_extra("musicbrainz_score", serde_json::json!(recording.score));

    if let Some(date) = release.date() {
        metadata = metadata.with_release_date(date);
        if let Some(year) = date.get(..4).and_then(|y| y.parse::<i32>().ok()) {
            metadata = metadata.with_year(year);
        }
    }

    if let Some(info) = release.label_info.first() {
        if let Some(label) = &info.label {
            metadata = metadata.with_label(&label.name);
        }
        if let Some(catno) = info.catalog_number.as_deref().filter(|c| !c.is_empty()) {
            metadata = metadata.with_catalog_number(catno);
        }
    }

    let confidence = calculate_confidence(&metadata, candidate.exact_match);
    metadata.set_confidence(confidence);
    metadata
}

/// Metadata provider backed by the MusicBrainz web service.
#[derive(Debug)]
pub struct MusicBrainzProvider {
    client: MusicBrainzClient,
    rate_limiter: RateLimiter,
}

impl MusicBrainzProvider {
    /// Create a provider against the public MusicBrainz service.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be created.
    pub fn new() -> EnrichResult<Self> {
        Self::with_settings(&MusicBrainzSettings::default())
    }

    /// Create a provider from explicit settings.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be created.
    pub fn with_settings(settings: &MusicBrainzSettings) -> EnrichResult<Self> {
        Ok(Self {
            client: MusicBrainzClient::with_settings(settings)?,
            rate_limiter: RateLimiter::new(settings.requests_per_second),
        })
    }
}

#[async_trait]
impl MetadataProvider for MusicBrainzProvider {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn lookup_with_hints(
        &self,
        ctx: &LookupContext,
        req: &SearchRequest,
    ) -> EnrichResult<TrackMetadata> {
        // 1. Search for candidate recordings
        self.rate_limiter.acquire(ctx).await?;
        let recordings = self.client.search_recordings(ctx, req).await?;

        let not_found = || {
            EnrichError::not_found(format!("{} - {}", req.artist, req.title), SOURCE_NAME)
        };

        let candidate = find_best_recording(&recordings, req).ok_or_else(not_found)?;
        log::debug!(
            "MusicBrainz candidate {} (score {}, exact: {})",
            candidate.recording.id,
            candidate.score,
            candidate.exact_match
        );

        // 2. Fetch releases and labels for the chosen recording
        self.rate_limiter.acquire(ctx).await?;
        let detail = self
            .client
            .get_recording(ctx, &candidate.recording.id)
            .await?;

        let release = find_best_release(&detail.releases, req.prefer_original_release)
            .ok_or_else(not_found)?;

        Ok(to_track_metadata(&candidate, release, req))
    }

    fn supports_genre(&self, _genre: &str) -> bool {
        true
    }

    fn rate_limit(&self) -> RateLimitInfo {
        RateLimitInfo {
            requests_per_second: 1.0,
            burst_allowed: 1,
            requires_identifying_header: true,
            requires_api_key: false,
        }
    }
}
