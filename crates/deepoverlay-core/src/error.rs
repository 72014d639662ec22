//! Error handling for DeepOverlay
//!
//! The overlay must never break the page it sits on, so most failure paths in
//! the engine degrade to "keep the last known good state" rather than
//! returning these errors to UI callers. They surface at parsing boundaries
//! (control messages, stored pages) and in host tooling.

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    /// A stored page value is not in the expected shape
    #[error("Malformed record for '{url}': {reason}")]
    MalformedRecord {
        /// The page URL the record was stored under.
        url: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A control message could not be understood
    #[error("Invalid control message: {0}")]
    InvalidMessage(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Creates a generic error from a message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::MalformedRecord {
            url: "https://example.com/a".to_string(),
            reason: "expected an array".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Malformed record for 'https://example.com/a': expected an array"
        );

        let err = Error::other("boom");
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
