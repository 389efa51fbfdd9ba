//! Filename heuristics for untagged files.
//!
//! Recovers artist and title from names such as `01 Artist - Title` or
//! `Artist - Album - Title`. After stripping a leading track or side number,
//! the number of hyphens in the remaining name selects one split rule from
//! [`RULES`]. Names the rules cannot split confidently are tagged with an
//! [`EdgeCase`] so they can be collected for manual review.
//!
//! The decomposer never fails. Unresolvable input yields empty fields; it is
//! up to the caller to treat those as "not enough information".

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A filename pattern the heuristics could not split confidently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeCase {
    NoHyphens,
    ThreeHyphens,
    ManyHyphens,
}

impl EdgeCase {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoHyphens => "no_hyphens",
            Self::ThreeHyphens => "three_hyphens",
            Self::ManyHyphens => "many_hyphens",
        }
    }

    /// Heading used when listing affected files, e.g. `THREE HYPHENS`.
    pub fn heading(self) -> String {
        self.as_str().replace('_', " ").to_uppercase()
    }
}

impl fmt::Display for EdgeCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EdgeCase {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "no_hyphens" => Ok(Self::NoHyphens),
            "three_hyphens" => Ok(Self::ThreeHyphens),
            "many_hyphens" => Ok(Self::ManyHyphens),
            other => Err(Error::UnknownEdgeCase(other.to_string())),
        }
    }
}

/// Artist and title recovered from a filename.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseResult {
    pub artist: String,
    pub title: String,
    /// Album detected along the way. Informational only.
    pub album: Option<String>,
    /// Set when the split is a guess (or no split was possible).
    pub edge_case: Option<EdgeCase>,
}

impl ParseResult {
    /// Both artist and title are non-empty.
    pub fn is_complete(&self) -> bool {
        !self.artist.is_empty() && !self.title.is_empty()
    }
}

/// How the hyphen-separated segments map onto artist and title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Split {
    /// No separator: accept only `Word Word`.
    TwoWords,
    /// `Artist - Title`
    ArtistTitle,
    /// `Artist - Album - Title`
    ArtistAlbumTitle,
    /// `Artist - ? - ? - Title`
    FirstAndFourth,
    /// `Artist - Artist - Album - Album - Title`
    CompoundArtist,
    /// First segment is the artist, last one the title.
    FirstAndLast,
}

#[derive(Debug)]
struct Rule {
    min_hyphens: usize,
    max_hyphens: usize,
    split: Split,
    edge_case: Option<EdgeCase>,
}

const CATCH_ALL: Rule = Rule {
    min_hyphens: 5,
    max_hyphens: usize::MAX,
    split: Split::FirstAndLast,
    edge_case: Some(EdgeCase::ManyHyphens),
};

/// Split rules keyed by hyphen count, in ascending order.
const RULES: &[Rule] = &[
    Rule {
        min_hyphens: 0,
        max_hyphens: 0,
        split: Split::TwoWords,
        edge_case: Some(EdgeCase::NoHyphens),
    },
    Rule {
        min_hyphens: 1,
        max_hyphens: 1,
        split: Split::ArtistTitle,
        edge_case: None,
    },
    Rule {
        min_hyphens: 2,
        max_hyphens: 2,
        split: Split::ArtistAlbumTitle,
        edge_case: None,
    },
    Rule {
        min_hyphens: 3,
        max_hyphens: 3,
        split: Split::FirstAndFourth,
        edge_case: Some(EdgeCase::ThreeHyphens),
    },
    Rule {
        min_hyphens: 4,
        max_hyphens: 4,
        split: Split::CompoundArtist,
        edge_case: None,
    },
    CATCH_ALL,
];

/// Leading track/side prefixes, tried in order, each at most once.
static TRACK_PREFIXES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^[0-9]+\.?\s+",        // "01 " or "1. "
        r"^[0-9]+\s*-\s*",       // "01-" or "1 - "
        r"^[A-Z][0-9]+\s+",      // "A1 " or "B2 "
        r"^[A-Z][0-9]+\s*-\s*",  // "A1-" or "B2 - "
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("track prefix pattern is valid"))
    .collect()
});

/// Remove a leading track or vinyl side number.
pub fn strip_track_prefix(name: &str) -> String {
    let mut stripped = name.to_string();
    for pattern in TRACK_PREFIXES.iter() {
        if let Some(m) = pattern.find(&stripped) {
            stripped.replace_range(..m.end(), "");
        }
    }
    stripped.trim().to_string()
}

/// Recover artist and title from a filename whose extension has already
/// been removed.
pub fn decompose(name: &str) -> ParseResult {
    let name = strip_track_prefix(name);
    let hyphens = name.matches('-').count();
    let rule = RULES
        .iter()
        .find(|r| (r.min_hyphens..=r.max_hyphens).contains(&hyphens))
        .unwrap_or(&CATCH_ALL);

    log::trace!(
        "Decomposing {:?}: {} hyphen(s), {:?} split",
        name,
        hyphens,
        rule.split
    );

    let mut result = apply_split(&name, rule.split);
    result.edge_case = rule.edge_case;
    result
}

/// Like [`decompose`], but takes a path and strips directory and extension.
pub fn decompose_path(path: &Path) -> ParseResult {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    decompose(&stem)
}

fn apply_split(name: &str, split: Split) -> ParseResult {
    let parts: Vec<&str> = name.split('-').map(str::trim).collect();
    let part = |i: usize| parts.get(i).copied().unwrap_or_default().to_string();

    match split {
        Split::TwoWords => {
            let words: Vec<&str> = name.split_whitespace().collect();
            match words.as_slice() {
                [artist, title] => ParseResult {
                    artist: (*artist).to_string(),
                    title: (*title).to_string(),
                    ..ParseResult::default()
                },
                _ => ParseResult::default(),
            }
        }
        Split::ArtistTitle => ParseResult {
            artist: part(0),
            title: part(1),
            ..ParseResult::default()
        },
        Split::ArtistAlbumTitle => ParseResult {
            artist: part(0),
            title: part(2),
            album: Some(part(1)),
            ..ParseResult::default()
        },
        Split::FirstAndFourth => ParseResult {
            artist: part(0),
            title: part(3),
            ..ParseResult::default()
        },
        Split::CompoundArtist => ParseResult {
            artist: format!("{}/{}", part(0), part(1)),
            title: part(4),
            album: Some(format!("{}/{}", part(2), part(3))),
            ..ParseResult::default()
        },
        Split::FirstAndLast => ParseResult {
            artist: part(0),
            title: parts.last().copied().unwrap_or_default().to_string(),
            ..ParseResult::default()
        },
    }
}
