//! Error taxonomy for the conversion pipeline.
//!
//! Pipeline-stage errors propagate to the immediate caller unchanged; the
//! orchestrator never catches and retries. Cache misses are represented as
//! absent values, never as errors.

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Errors surfaced by the conversion pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// Input bytes do not parse as any supported raster format.
    #[error("image decode failed: {0}")]
    Decode(String),

    /// Re-encoding a decoded image failed.
    #[error("image encode failed: {0}")]
    Encode(String),

    /// The source declares a media kind the converter does not handle.
    #[error("unsupported media kind: {0}")]
    UnsupportedType(String),

    /// A source collaborator failed. Surfaced as-is; retry policy belongs to
    /// the collaborator or the caller.
    #[error("source error: {0}")]
    Source(String),

    /// Video pipeline error.
    #[error(transparent)]
    Av(#[from] assetforge_av::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ConvertError {
    /// Create a new Decode error.
    pub fn decode<S: Into<String>>(msg: S) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a new Encode error.
    pub fn encode<S: Into<String>>(msg: S) -> Self {
        Self::Encode(msg.into())
    }

    /// Create a new Source error.
    pub fn source<S: Into<String>>(msg: S) -> Self {
        Self::Source(msg.into())
    }

    /// Create a new Internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }
}
