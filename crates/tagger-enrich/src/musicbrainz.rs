//! MusicBrainz web service client.
//!
//! Thin HTTP layer over the two endpoints the enricher needs: recording
//! search and recording lookup with releases and labels. Pacing is the
//! caller's job (see [`MusicBrainzProvider`]); this client only issues
//! requests and decodes responses.
//!
//! [`MusicBrainzProvider`]: crate::enrich::musicbrainz::MusicBrainzProvider

use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tagger_core::SearchRequest;

use crate::config::MusicBrainzSettings;
use crate::context::LookupContext;
use crate::error::{EnrichError, EnrichResult};

pub const MUSICBRAINZ_API_BASE: &str = "https://musicbrainz.org/ws/2";

/// Identifying `User-Agent`, required by the MusicBrainz terms of use.
pub const USER_AGENT: &str = concat!(
    "tagger/",
    env!("CARGO_PKG_VERSION"),
    " (https://github.com/cerberussg/tagger)"
);

pub(crate) const SOURCE_NAME: &str = "MusicBrainz";

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Response of the recording search endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordingSearchResponse {
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub recordings: Vec<MbRecording>,
}

/// A recording as returned by search (with relevance score) or lookup.
#[derive(Debug, Clone, Deserialize)]
pub struct MbRecording {
    pub id: String,
    pub title: String,
    /// Search relevance, 0-100. Absent on direct lookups.
    #[serde(default)]
    pub score: i64,
    /// Length in milliseconds.
    #[serde(default)]
    pub length: Option<u64>,
    #[serde(rename = "artist-credit", default)]
    pub artist_credit: Vec<MbArtistCredit>,
    #[serde(default)]
    pub releases: Vec<MbRelease>,
}

impl MbRecording {
    /// Returns `true` if any credited artist is named `artist`, ignoring case.
    pub fn credits_artist(&self, artist: &str) -> bool {
        self.artist_credit
            .iter()
            .any(|credit| eq_ignore_case(&credit.artist.name, artist))
    }

    /// Returns `true` if the title equals `title`, ignoring case.
    pub fn has_title(&self, title: &str) -> bool {
        eq_ignore_case(&self.title, title)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MbArtistCredit {
    /// Credited name, which may differ from the artist's canonical name.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub joinphrase: String,
    pub artist: MbArtist,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MbArtist {
    pub id: String,
    pub name: String,
    #[serde(rename = "sort-name", default)]
    pub sort_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MbRelease {
    pub id: String,
    pub title: String,
    /// ISO-8601 date, possibly partial (`1993`, `1993-04`).
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(rename = "label-info", default)]
    pub label_info: Vec<MbLabelInfo>,
}

impl MbRelease {
    /// The release date, if present and non-empty.
    pub fn date(&self) -> Option<&str> {
        self.date.as_deref().filter(|d| !d.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MbLabelInfo {
    #[serde(rename = "catalog-number", default)]
    pub catalog_number: Option<String>,
    #[serde(default)]
    pub label: Option<MbLabel>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MbLabel {
    #[serde(default)]
    pub id: String,
    pub name: String,
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// MusicBrainz API client.
#[derive(Debug, Clone)]
pub struct MusicBrainzClient {
    http: Client,
    base_url: String,
}

impl MusicBrainzClient {
    /// Create a client against the public MusicBrainz service.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new() -> EnrichResult<Self> {
        Self::with_settings(&MusicBrainzSettings::default())
    }

    /// Create a client from explicit settings (base URL, user agent,
    /// request timeout).
    pub fn with_settings(settings: &MusicBrainzSettings) -> EnrichResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(settings.user_agent.as_str())
            .build()
            .map_err(|e| EnrichError::api(SOURCE_NAME, format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the Lucene query for a search request.
    ///
    /// Artist and title are always included; the album is added as a
    /// release constraint when hinted.
    pub fn search_query(req: &SearchRequest) -> String {
        let query = format!(
            r#"artist:"{}" AND recording:"{}""#,
            escape_term(&req.artist),
            escape_term(&req.title)
        );
        match req.album_hint() {
            Some(album) => format!(r#"{query} AND release:"{}""#, escape_term(album)),
            None => query,
        }
    }

    /// Search recordings matching the request.
    ///
    /// Rate limit: 1 request/second (enforced by caller).
    pub async fn search_recordings(
        &self,
        ctx: &LookupContext,
        req: &SearchRequest,
    ) -> EnrichResult<Vec<MbRecording>> {
        let query = Self::search_query(req);
        let limit = req.max_results.to_string();
        log::debug!("MusicBrainz search: {}", query);

        let request = self.http.get(format!("{}/recording", self.base_url)).query(&[
            ("query", query.as_str()),
            ("limit", limit.as_str()),
            ("fmt", "json"),
        ]);

        let response: RecordingSearchResponse = self.get_json(ctx, request).await?;
        Ok(response.recordings)
    }

    /// Get a recording with its releases and their label information.
    ///
    /// Rate limit: 1 request/second (enforced by caller).
    pub async fn get_recording(
        &self,
        ctx: &LookupContext,
        recording_id: &str,
    ) -> EnrichResult<MbRecording> {
        let request = self
            .http
            .get(format!("{}/recording/{}", self.base_url, recording_id))
            // The space is form-encoded as `+`, giving `inc=releases+labels`.
            .query(&[("inc", "releases labels"), ("fmt", "json")]);

        self.get_json(ctx, request).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        ctx: &LookupContext,
        request: RequestBuilder,
    ) -> EnrichResult<T> {
        ctx.run(async {
            let response = request
                .header(ACCEPT, "application/json")
                .send()
                .await
                .map_err(|e| EnrichError::api(SOURCE_NAME, format!("request failed: {e}")))?
                .error_for_status()
                .map_err(|e| EnrichError::api(SOURCE_NAME, e))?;

            response.json::<T>().await.map_err(|e| {
                EnrichError::api(SOURCE_NAME, format!("failed to parse response: {e}"))
            })
        })
        .await
    }
}

/// Escape characters that would end a quoted Lucene term.
fn escape_term(term: &str) -> String {
    term.replace('\\', r"\\").replace('"', r#"\""#)
}
