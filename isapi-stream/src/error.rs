//! Error types for the isapi-stream crate.

/// Errors that can occur while connecting to or reading the alert stream.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// The HTTP request could not be issued or the connection dropped mid-read
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a status other than 200
    #[error("event stream returned status {0}")]
    Status(u16),

    /// The authentication challenge was missing or could not be understood
    #[error("unusable authentication challenge: {0}")]
    Challenge(String),

    /// Every allowed connection attempt failed in a row
    #[error("event stream gave up after {attempts} consecutive failed attempts")]
    RetriesExhausted {
        /// The configured attempt budget that was spent
        attempts: u32,
    },
}

/// Errors raised while turning a framed record into an [`crate::EventRecord`].
///
/// These are always local to a single record: the stream keeps running.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The record was not well-formed XML
    #[error("invalid event XML: {0}")]
    Xml(String),

    /// A field the caller asked for is absent from the record
    #[error("event record is missing the {0} field")]
    MissingField(&'static str),

    /// A field was present but its value could not be interpreted
    #[error("event record has an invalid {field} value: {value:?}")]
    InvalidField {
        /// The field that failed to parse
        field: &'static str,
        /// The raw value as it appeared on the wire
        value: String,
    },
}

/// Convenience type alias for Results using StreamError.
pub type Result<T> = std::result::Result<T, StreamError>;
