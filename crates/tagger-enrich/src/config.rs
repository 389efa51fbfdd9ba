use anyhow::{Context, Result};
use confyg::{env, Confygery};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tagger_core::Strategy;

use crate::musicbrainz::{MUSICBRAINZ_API_BASE, USER_AGENT};

/// Configuration for tagger.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. Environment variables (TAGGER_* prefix, highest priority)
/// 2. Config file (~/.config/tagger/config.toml)
/// 3. Built-in defaults (lowest priority)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Orchestration settings (`[enricher]` table).
    pub enricher: EnricherConfig,

    /// MusicBrainz adapter settings (`[musicbrainz]` table).
    pub musicbrainz: MusicBrainzSettings,
}

/// How the [`Enricher`] consults its providers and which results it accepts.
///
/// [`Enricher`]: crate::enrich::enricher::Enricher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnricherConfig {
    pub strategy: Strategy,

    /// Results scoring below this are rejected.
    pub min_confidence: f64,

    /// Reject results without a record label.
    pub require_label: bool,

    /// Overall budget for one lookup, across all providers (seconds).
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,

    /// Reserved. No cache layer consults this yet.
    pub cache_enabled: bool,

    /// Reserved (seconds).
    #[serde(with = "duration_secs")]
    pub cache_ttl: Duration,
}

impl Default for EnricherConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::First,
            min_confidence: 0.7,
            require_label: false,
            request_timeout: Duration::from_secs(30),
            cache_enabled: true,
            cache_ttl: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl EnricherConfig {
    #[must_use]
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    #[must_use]
    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    #[must_use]
    pub fn with_require_label(mut self, require_label: bool) -> Self {
        self.require_label = require_label;
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Settings for the MusicBrainz client and provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MusicBrainzSettings {
    /// API root, overridable for mirrors and tests.
    pub base_url: String,

    /// Identifying `User-Agent` sent with every request.
    pub user_agent: String,

    /// Pacing between requests from one provider instance.
    pub requests_per_second: u32,

    /// Per-request HTTP timeout.
    pub timeout_secs: u64,
}

impl Default for MusicBrainzSettings {
    fn default() -> Self {
        Self {
            base_url: MUSICBRAINZ_API_BASE.to_string(),
            user_agent: USER_AGENT.to_string(),
            requests_per_second: 1,
            timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Searches for config file at: ~/.config/tagger/config.toml
    /// Reads environment variables with TAGGER_ prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from an explicit file, then the environment.
    ///
    /// A missing file is not an error; defaults apply.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder
                .add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("tagger");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let config: Self = builder.build().context("Failed to build configuration")?;
        log::debug!("Loaded configuration: {:?}", config);

        Ok(config)
    }
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/tagger/config.toml
/// - macOS: ~/Library/Application Support/tagger/config.toml
/// - Windows: %APPDATA%\tagger\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tagger")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# Tagger Configuration File
#
# Environment variables (TAGGER_* prefix) override values set here.

[enricher]
# How providers are consulted: "first", "best" or "fallback"
strategy = "first"

# Results scoring below this are rejected (0.0 - 1.0)
min_confidence = 0.7

# Reject results that carry no record label
require_label = false

# Budget for one lookup across all providers, in seconds
request_timeout = 30

[musicbrainz]
# Identify your application; MusicBrainz rejects anonymous clients
#user_agent = "my-app/1.0 (me@example.com)"

# Requests per second against the API
requests_per_second = 1
"#
}

/// (De)serialize a [`Duration`] as whole seconds.
mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
