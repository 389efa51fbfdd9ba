//! Enrichment error types.

use thiserror::Error;

/// Errors that can occur while looking up metadata.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnrichError {
    /// No candidate qualified at some stage of the lookup.
    #[error("not found: {entity} at {source_name}")]
    NotFound { entity: String, source_name: String },

    /// The external source could not be reached, answered with a
    /// non-success status, or sent a body that could not be decoded.
    #[error("API error from {source_name}: {message}")]
    Api {
        source_name: String,
        message: String,
    },

    /// The enricher has no providers registered.
    #[error("no providers available")]
    NoProvider,

    /// The caller cancelled the lookup.
    #[error("lookup canceled")]
    Canceled,

    /// The lookup ran past its deadline.
    #[error("lookup deadline exceeded")]
    DeadlineExceeded,
}

impl EnrichError {
    pub fn not_found(entity: impl Into<String>, source_name: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            source_name: source_name.into(),
        }
    }

    pub fn api(source_name: impl Into<String>, message: impl ToString) -> Self {
        Self::Api {
            source_name: source_name.into(),
            message: message.to_string(),
        }
    }

    /// Returns `true` when the error indicates nothing matched.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` for cancellation and deadline errors, which must be
    /// propagated unchanged.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Canceled | Self::DeadlineExceeded)
    }
}

/// Convenience alias for enrichment results.
pub type EnrichResult<T> = std::result::Result<T, EnrichError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(EnrichError::not_found("recording", "MusicBrainz").is_not_found());
        assert!(!EnrichError::api("MusicBrainz", "status 503").is_not_found());
        assert!(EnrichError::Canceled.is_cancellation());
        assert!(EnrichError::DeadlineExceeded.is_cancellation());
        assert!(!EnrichError::NoProvider.is_cancellation());
    }

    #[test]
    fn test_error_display() {
        let err = EnrichError::api("MusicBrainz", "returned status 503");
        assert_eq!(
            err.to_string(),
            "API error from MusicBrainz: returned status 503"
        );
        assert_eq!(
            EnrichError::not_found("release", "MusicBrainz").to_string(),
            "not found: release at MusicBrainz"
        );
    }
}
