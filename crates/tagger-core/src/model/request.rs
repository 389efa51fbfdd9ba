use std::num::NonZeroU32;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Number of candidates requested from a provider when the caller does not
/// say otherwise.
pub const DEFAULT_MAX_RESULTS: NonZeroU32 = NonZeroU32::MIN.saturating_add(4);

/// Search parameters for a single lookup.
///
/// Built per call and not modified afterwards. Artist and title are
/// required; everything else is an optional hint that a provider may use to
/// narrow its search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub artist: String,
    pub title: String,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub year: Option<i32>,
    pub duration: Option<Duration>,

    /// Prefer the earliest dated release over the first one listed.
    pub prefer_original_release: bool,

    /// Upper bound on candidates requested from the provider.
    pub max_results: NonZeroU32,
}

impl SearchRequest {
    /// Create a request for `artist` / `title` with default preferences:
    /// original releases preferred, at most five candidates.
    #[must_use]
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
            album: None,
            genre: None,
            year: None,
            duration: None,
            prefer_original_release: true,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    #[must_use]
    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    #[must_use]
    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    #[must_use]
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    #[must_use]
    pub fn with_prefer_original_release(mut self, prefer: bool) -> Self {
        self.prefer_original_release = prefer;
        self
    }

    /// Set the candidate limit. Zero is raised to one.
    #[must_use]
    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = NonZeroU32::new(max_results).unwrap_or(NonZeroU32::MIN);
        self
    }

    /// The non-empty album hint, if any.
    pub fn album_hint(&self) -> Option<&str> {
        self.album.as_deref().filter(|a| !a.trim().is_empty())
    }

    /// A copy that keeps only artist, title, and the preference flags.
    ///
    /// Album, genre, year, and duration hints are dropped.
    #[must_use]
    pub fn simplified(&self) -> Self {
        Self {
            artist: self.artist.clone(),
            title: self.title.clone(),
            album: None,
            genre: None,
            year: None,
            duration: None,
            prefer_original_release: self.prefer_original_release,
            max_results: self.max_results,
        }
    }
}

/// Rate-limiting capabilities advertised by a provider.
///
/// Purely descriptive: callers are not expected to enforce it, the provider
/// paces itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateLimitInfo {
    pub requests_per_second: f64,
    pub burst_allowed: u32,
    /// The provider rejects requests without an identifying `User-Agent`.
    pub requires_identifying_header: bool,
    pub requires_api_key: bool,
}
