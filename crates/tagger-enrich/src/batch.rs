//! Batch processing of audio files.
//!
//! For every path the caller supplies, the [`BatchProcessor`] reads the
//! embedded tags, falls back to filename decomposition when there are none,
//! and decides whether the file still needs enrichment. If an [`Enricher`]
//! is attached, files with artist and title but no label are looked up.
//! Files are handled one at a time.
//!
//! Directory traversal and tag parsing are left to the caller: paths come
//! in as a list (filter them with [`is_resource_fork`]) and tags through the
//! [`TagReader`] trait.

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use tagger_core::{decompose_path, EdgeCase, TrackMetadata};

use crate::context::LookupContext;
use crate::enrich::enricher::Enricher;

/// Raw frame carrying the publisher (record label).
const FRAME_PUBLISHER: &str = "TPUB";
/// Raw user-defined text frame, where some taggers put the label.
const FRAME_USER_TEXT: &str = "TXXX";

/// Tags embedded in an audio file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbeddedTags {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub genre: String,
    pub year: Option<i32>,
    /// Raw frames by identifier (`TPUB`, `TXXX`, ...), rendered as text.
    pub raw: BTreeMap<String, String>,
}

impl EmbeddedTags {
    /// The record label, if the file carries one.
    ///
    /// `TXXX` takes precedence over `TPUB`; empty values are ignored.
    pub fn label(&self) -> Option<&str> {
        // A blank TXXX does not hide a TPUB label.
        [FRAME_USER_TEXT, FRAME_PUBLISHER]
            .into_iter()
            .filter_map(|frame| self.raw.get(frame))
            .map(|value| value.trim())
            .find(|value| !value.is_empty())
    }
}

/// Reads embedded tags from a file.
pub trait TagReader {
    /// `Err` if the file cannot be read at all, `Ok(None)` if it has no
    /// embedded tags.
    fn read(&self, path: &Path) -> io::Result<Option<EmbeddedTags>>;
}

/// Returns `true` for AppleDouble shadow files (`._name`), which carry
/// Finder metadata rather than audio.
pub fn is_resource_fork(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with("._"))
}

/// What happened to a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileStatus {
    /// The file could not be read.
    Error,
    /// Artist/title are unknown, or no enricher was attached.
    NeedsEnrichment,
    /// The file already carries a record label.
    HasLabel,
    /// The enricher returned metadata.
    Enriched,
    /// The enricher was consulted and failed.
    EnrichmentFailed,
}

impl FileStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::NeedsEnrichment => "needs_enrichment",
            Self::HasLabel => "has_label",
            Self::Enriched => "enriched",
            Self::EnrichmentFailed => "enrichment_failed",
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The result of processing one file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub status: FileStatus,
    pub artist: String,
    pub title: String,
    /// Set when artist/title came from a filename that did not split cleanly.
    pub edge_case: Option<EdgeCase>,
    /// Present when `status` is [`FileStatus::Enriched`].
    pub metadata: Option<TrackMetadata>,
}

impl FileOutcome {
    fn new(path: &Path, status: FileStatus) -> Self {
        Self {
            path: path.to_path_buf(),
            status,
            artist: String::new(),
            title: String::new(),
            edge_case: None,
            metadata: None,
        }
    }
}

/// Files grouped by the filename edge case they triggered.
///
/// This is the input a report generator renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeCaseReport {
    cases: BTreeMap<EdgeCase, Vec<PathBuf>>,
}

impl EdgeCaseReport {
    pub fn record(&mut self, edge_case: EdgeCase, path: impl Into<PathBuf>) {
        self.cases.entry(edge_case).or_default().push(path.into());
    }

    /// Files affected by `edge_case`, in processing order.
    pub fn files(&self, edge_case: EdgeCase) -> &[PathBuf] {
        self.cases
            .get(&edge_case)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of affected files across all edge cases.
    pub fn total(&self) -> usize {
        self.cases.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EdgeCase, &[PathBuf])> {
        self.cases.iter().map(|(case, files)| (*case, files.as_slice()))
    }
}

/// Aggregate result of a batch run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub outcomes: Vec<FileOutcome>,
    pub edge_cases: EdgeCaseReport,
}

impl BatchSummary {
    fn push(&mut self, outcome: FileOutcome) {
        if let Some(edge_case) = outcome.edge_case {
            self.edge_cases.record(edge_case, &outcome.path);
        }
        self.outcomes.push(outcome);
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn count(&self, status: FileStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    /// Percentage of enrichment attempts that succeeded, or `None` if
    /// nothing was looked up.
    pub fn success_rate(&self) -> Option<f64> {
        let enriched = self.count(FileStatus::Enriched);
        let attempted = enriched + self.count(FileStatus::EnrichmentFailed);
        (attempted > 0).then(|| enriched as f64 / attempted as f64 * 100.0)
    }

    /// Percentage of all files that still need enrichment.
    pub fn needs_enrichment_percentage(&self) -> f64 {
        if self.outcomes.is_empty() {
            return 0.0;
        }
        self.count(FileStatus::NeedsEnrichment) as f64 / self.total() as f64 * 100.0
    }

    /// Enriched metadata by file.
    pub fn enriched(&self) -> impl Iterator<Item = (&Path, &TrackMetadata)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.metadata.as_ref().map(|m| (o.path.as_path(), m)))
    }
}

/// Classifies files and optionally enriches them.
#[derive(Debug)]
pub struct BatchProcessor<'a, R> {
    reader: R,
    enricher: Option<&'a Enricher>,
}

impl<'a, R: TagReader> BatchProcessor<'a, R> {
    /// A processor that classifies files without looking anything up.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            enricher: None,
        }
    }

    /// Look up files that have artist and title but no label.
    #[must_use]
    pub fn with_enricher(mut self, enricher: &'a Enricher) -> Self {
        self.enricher = Some(enricher);
        self
    }

    /// Process `paths` in order.
    pub async fn process<I, P>(&self, ctx: &LookupContext, paths: I) -> BatchSummary
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut summary = BatchSummary::default();
        for path in paths {
            summary.push(self.process_file(ctx, path.as_ref()).await);
        }

        log::info!(
            "Processed {} files: {} with label, {} need enrichment, {} enriched, {} failed, {} unreadable",
            summary.total(),
            summary.count(FileStatus::HasLabel),
            summary.count(FileStatus::NeedsEnrichment),
            summary.count(FileStatus::Enriched),
            summary.count(FileStatus::EnrichmentFailed),
            summary.count(FileStatus::Error),
        );
        summary
    }

    /// Process a single file.
    pub async fn process_file(&self, ctx: &LookupContext, path: &Path) -> FileOutcome {
        let tags = match self.reader.read(path) {
            Ok(tags) => tags,
            Err(e) => {
                log::warn!("Failed to read {}: {}", path.display(), e);
                return FileOutcome::new(path, FileStatus::Error);
            }
        };

        let mut outcome = FileOutcome::new(path, FileStatus::NeedsEnrichment);
        let mut has_label = false;

        match tags {
            Some(tags) => {
                outcome.artist = tags.artist.trim().to_string();
                outcome.title = tags.title.trim().to_string();
                has_label = tags.label().is_some();
            }
            None => {
                log::debug!("No embedded tags in {}, parsing filename", path.display());
                let parsed = decompose_path(path);
                outcome.artist = parsed.artist;
                outcome.title = parsed.title;
                outcome.edge_case = parsed.edge_case;
            }
        }

        if outcome.artist.is_empty() || outcome.title.is_empty() {
            log::debug!("No artist/title for {}", path.display());
            return outcome;
        }

        if has_label {
            outcome.status = FileStatus::HasLabel;
            return outcome;
        }

        let Some(enricher) = self.enricher else {
            return outcome;
        };

        match enricher.lookup(ctx, &outcome.artist, &outcome.title).await {
            Ok(metadata) => {
                log::debug!(
                    "Enriched {} via {} (confidence {:.2})",
                    path.display(),
                    metadata.provider_name,
                    metadata.confidence()
                );
                outcome.status = FileStatus::Enriched;
                outcome.metadata = Some(metadata);
            }
            Err(e) => {
                log::debug!("Enrichment failed for {}: {}", path.display(), e);
                outcome.status = FileStatus::EnrichmentFailed;
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::config::EnricherConfig;
    use crate::enrich::mock::{metadata, MockProvider};
    use crate::error::EnrichError;

    /// Serves tags from memory; unknown paths are unreadable.
    #[derive(Debug, Default)]
    struct MemoryTagReader {
        files: HashMap<PathBuf, Option<EmbeddedTags>>,
    }

    impl MemoryTagReader {
        fn with(mut self, path: &str, tags: Option<EmbeddedTags>) -> Self {
            self.files.insert(PathBuf::from(path), tags);
            self
        }
    }

    impl TagReader for MemoryTagReader {
        fn read(&self, path: &Path) -> io::Result<Option<EmbeddedTags>> {
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
        }
    }

    fn tags(artist: &str, title: &str) -> EmbeddedTags {
        EmbeddedTags {
            artist: artist.to_string(),
            title: title.to_string(),
            ..EmbeddedTags::default()
        }
    }

    fn labelled(artist: &str, title: &str, frame: &str, label: &str) -> EmbeddedTags {
        let mut tags = tags(artist, title);
        tags.raw.insert(frame.to_string(), label.to_string());
        tags
    }

    #[test]
    fn test_label_detection() {
        assert_eq!(tags("a", "t").label(), None);
        assert_eq!(labelled("a", "t", "TPUB", "Metalheadz").label(), Some("Metalheadz"));
        assert_eq!(labelled("a", "t", "TPUB", "  ").label(), None);

        let mut both = labelled("a", "t", "TPUB", "Publisher");
        both.raw.insert("TXXX".to_string(), "Label".to_string());
        assert_eq!(both.label(), Some("Label"));

        let mut empty_txxx = labelled("a", "t", "TPUB", "Publisher");
        empty_txxx.raw.insert("TXXX".to_string(), String::new());
        assert_eq!(empty_txxx.label(), Some("Publisher"));
    }

    #[test]
    fn test_is_resource_fork() {
        assert!(is_resource_fork(Path::new("/music/._Goldie - Timeless.aiff")));
        assert!(!is_resource_fork(Path::new("/music/Goldie - Timeless.aiff")));
        assert!(!is_resource_fork(Path::new("/music/._dir/track.aiff")));
        assert!(!is_resource_fork(Path::new("/")));
    }

    #[test]
    fn test_file_status_names() {
        assert_eq!(FileStatus::NeedsEnrichment.to_string(), "needs_enrichment");
        assert_eq!(FileStatus::EnrichmentFailed.as_str(), "enrichment_failed");
    }

    #[tokio::test]
    async fn test_classification_without_enricher() {
        let reader = MemoryTagReader::default()
            .with("/m/labelled.aiff", Some(labelled("Photek", "Ni Ten Ichi Ryu", "TPUB", "Science")))
            .with("/m/plain.aiff", Some(tags("Photek", "The Hidden Camera")))
            .with("/m/untitled.aiff", Some(tags("Photek", "  ")))
            .with("/m/Dillinja - Threshold.aiff", None);

        let processor = BatchProcessor::new(reader);
        let summary = processor
            .process(
                &LookupContext::new(),
                [
                    "/m/labelled.aiff",
                    "/m/plain.aiff",
                    "/m/untitled.aiff",
                    "/m/Dillinja - Threshold.aiff",
                    "/m/missing.aiff",
                ],
            )
            .await;

        assert_eq!(summary.total(), 5);
        assert_eq!(summary.count(FileStatus::HasLabel), 1);
        assert_eq!(summary.count(FileStatus::NeedsEnrichment), 3);
        assert_eq!(summary.count(FileStatus::Error), 1);
        assert_eq!(summary.success_rate(), None);
        assert!((summary.needs_enrichment_percentage() - 60.0).abs() < 1e-9);

        let parsed = &summary.outcomes[3];
        assert_eq!(parsed.artist, "Dillinja");
        assert_eq!(parsed.title, "Threshold");
        assert_eq!(parsed.edge_case, None);
    }

    #[tokio::test]
    async fn test_edge_cases_are_collected() {
        let reader = MemoryTagReader::default()
            .with("/m/RandomSingleToken.aiff", None)
            .with("/m/A - B - C - D.aiff", None)
            .with("/m/Two Words.aiff", None);

        let summary = BatchProcessor::new(reader)
            .process(
                &LookupContext::new(),
                ["/m/RandomSingleToken.aiff", "/m/A - B - C - D.aiff", "/m/Two Words.aiff"],
            )
            .await;

        let report = &summary.edge_cases;
        assert_eq!(report.total(), 3);
        assert_eq!(
            report.files(EdgeCase::NoHyphens),
            [PathBuf::from("/m/RandomSingleToken.aiff"), PathBuf::from("/m/Two Words.aiff")]
        );
        assert_eq!(report.files(EdgeCase::ThreeHyphens), [PathBuf::from("/m/A - B - C - D.aiff")]);
        assert!(report.files(EdgeCase::ManyHyphens).is_empty());

        // Unsplittable names have no artist, split ones still go through.
        assert_eq!(summary.outcomes[0].status, FileStatus::NeedsEnrichment);
        assert_eq!(summary.outcomes[1].artist, "A");
        assert_eq!(summary.outcomes[1].title, "D");
        assert_eq!(summary.outcomes[2].artist, "Two");
    }

    #[tokio::test]
    async fn test_enrichment_outcomes() {
        let provider = MockProvider::new("mock", |req| {
            if req.artist == "Known" {
                Ok(metadata("mock", 0.9, Some("Reinforced")))
            } else {
                Err(EnrichError::not_found(&req.title, "mock"))
            }
        });
        let enricher = Enricher::new(vec![provider.boxed()], EnricherConfig::default());

        let reader = MemoryTagReader::default()
            .with("/m/known.aiff", Some(tags("Known", "Track")))
            .with("/m/unknown.aiff", Some(tags("Unknown", "Track")))
            .with("/m/labelled.aiff", Some(labelled("Known", "Track", "TXXX", "Moving Shadow")));

        let summary = BatchProcessor::new(reader)
            .with_enricher(&enricher)
            .process(
                &LookupContext::new(),
                ["/m/known.aiff", "/m/unknown.aiff", "/m/labelled.aiff"],
            )
            .await;

        assert_eq!(summary.count(FileStatus::Enriched), 1);
        assert_eq!(summary.count(FileStatus::EnrichmentFailed), 1);
        assert_eq!(summary.count(FileStatus::HasLabel), 1);
        assert!((summary.success_rate().unwrap() - 50.0).abs() < 1e-9);
        assert!(summary.needs_enrichment_percentage().abs() < 1e-9);

        let enriched: Vec<_> = summary.enriched().collect();
        assert_eq!(enriched.len(), 1);
        assert_eq!(enriched[0].0, Path::new("/m/known.aiff"));
        assert_eq!(enriched[0].1.label.as_deref(), Some("Reinforced"));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let summary = BatchProcessor::new(MemoryTagReader::default())
            .process(&LookupContext::new(), Vec::<PathBuf>::new())
            .await;
        assert_eq!(summary.total(), 0);
        assert!(summary.edge_cases.is_empty());
        assert!(summary.needs_enrichment_percentage().abs() < f64::EPSILON);
    }
}
