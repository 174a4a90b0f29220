//! Error types for ifsc-dl
//!
//! Two failure families matter to the crawler:
//! - transport failures — the HTTP call itself fails (network, timeout,
//!   non-success status), surfaced as [`Error::Network`]
//! - shape failures — the body parses as JSON but a structural extraction
//!   fails (missing field, id pattern mismatch, bad timestamp), surfaced as
//!   [`Error::Serialization`] or [`Error::Shape`]
//!
//! Both are caught at the fetcher boundary and converted into per-resource
//! failure markers; only the root season-index fetch lets them escape.

use thiserror::Error;

/// Result type alias for ifsc-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for ifsc-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "concurrency")
        key: Option<String>,
    },

    /// Network error (transport failure or non-success HTTP status)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error (malformed or structurally unexpected JSON)
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Structural extraction failed on an otherwise well-formed response
    #[error("shape error: {0}")]
    Shape(#[from] ShapeError),

    /// I/O error (output sink)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Construct a configuration error for a specific key
    pub(crate) fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }
}

/// Structural extraction errors
///
/// These occur when a response parses as JSON but fails an extraction the
/// data model requires.
#[derive(Debug, Error)]
pub enum ShapeError {
    /// Event resource URL did not contain an extractable event id
    #[error("no event id in resource url {url}")]
    MissingEventId {
        /// The URL that failed the id pattern
        url: String,
    },

    /// Timezone label from the API is not a recognized IANA zone
    #[error("unrecognized timezone label {label:?}")]
    UnknownTimezone {
        /// The label as received
        label: String,
    },

    /// Timestamp field could not be parsed in any accepted format
    #[error("invalid timestamp {value:?}")]
    InvalidTimestamp {
        /// The raw timestamp string
        value: String,
    },

    /// Local timestamp does not exist in the declared timezone (DST gap)
    #[error("local time {value:?} does not exist in timezone {zone}")]
    NonexistentLocalTime {
        /// The raw timestamp string
        value: String,
        /// The timezone it was interpreted in
        zone: String,
    },

    /// Interval ends before it starts after timezone conversion
    #[error("interval ends before it starts ({start} > {end})")]
    InvertedInterval {
        /// Interval start, RFC 3339
        start: String,
        /// Interval end, RFC 3339
        end: String,
    },

    /// Full-results payload was valid JSON but not an array of rankings
    #[error("expected a JSON array of rankings, got {got}")]
    NotRankings {
        /// JSON type name of the payload actually received
        got: &'static str,
    },
}
