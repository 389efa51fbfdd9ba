use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Policy governing how multiple providers are consulted and reconciled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Accept the first qualifying result in registration order.
    #[default]
    First,
    /// Query every provider and keep the highest-confidence qualifying result.
    Best,
    /// Like `First`, then retry once with only artist and title.
    Fallback,
}

impl Strategy {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Best => "best",
            Self::Fallback => "fallback",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" => Ok(Self::First),
            "best" => Ok(Self::Best),
            "fallback" => Ok(Self::Fallback),
            other => Err(Error::UnknownStrategy(other.to_string())),
        }
    }
}
