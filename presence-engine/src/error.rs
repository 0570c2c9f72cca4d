//! Error types for the presence-engine crate.

/// Errors raised by mapping construction and event evaluation.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A channel's rule list binds the same light twice. Uniqueness is
    /// scoped per channel; the same light on two different channels is fine.
    #[error("duplicate light {light} in channel {channel}")]
    DuplicateLight {
        /// The channel whose rule list repeats the light
        channel: u32,
        /// The repeated light identifier
        light: String,
    },

    /// A required field of the incoming record was missing or unreadable
    #[error(transparent)]
    Event(#[from] isapi_stream::ParseError),
}

/// Convenience type alias for Results using EngineError.
pub type Result<T> = std::result::Result<T, EngineError>;
