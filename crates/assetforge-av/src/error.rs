//! Error types for assetforge-av.

use std::path::PathBuf;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while probing or transcoding video.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required external tool is not available.
    #[error("tool not found: {tool}")]
    ToolNotFound { tool: String },

    /// The source is not readable or has no playable video track.
    #[error("invalid asset: {}: {reason}", path.display())]
    InvalidAsset { path: PathBuf, reason: String },

    /// The decode side of the pipeline failed to start.
    #[error("reader initialization failed: {message}")]
    ReaderInit { message: String },

    /// The encode side of the pipeline failed to start.
    #[error("writer initialization failed: {message}")]
    WriterInit { message: String },

    /// The pump loop or finalization failed.
    #[error("compression failed: {0}")]
    Compression(CompressionFailure),

    /// Failed to parse tool output.
    #[error("failed to parse {tool} output: {message}")]
    Parse { tool: String, message: String },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Terminal outcome of a failed transcode.
#[derive(Debug, thiserror::Error)]
pub enum CompressionFailure {
    /// The caller abandoned the operation; resources were torn down.
    #[error("cancelled")]
    Cancelled,

    /// The encoder or decoder reported a failure.
    #[error("{0}")]
    Encoder(String),
}

impl Error {
    /// Create a tool not found error.
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Self::ToolNotFound { tool: tool.into() }
    }

    /// Create an invalid asset error.
    pub fn invalid_asset(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidAsset {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a reader initialization error.
    pub fn reader_init(message: impl Into<String>) -> Self {
        Self::ReaderInit {
            message: message.into(),
        }
    }

    /// Create a writer initialization error.
    pub fn writer_init(message: impl Into<String>) -> Self {
        Self::WriterInit {
            message: message.into(),
        }
    }

    /// Create a parse error.
    pub fn parse_error(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create a compression error carrying an encoder diagnostic.
    pub fn encoder_failed(diagnostic: impl Into<String>) -> Self {
        Self::Compression(CompressionFailure::Encoder(diagnostic.into()))
    }

    /// Create a cancelled compression error.
    pub fn cancelled() -> Self {
        Self::Compression(CompressionFailure::Cancelled)
    }

    /// Whether this error represents a cancelled transcode.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Compression(CompressionFailure::Cancelled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_is_distinguishable() {
        assert!(Error::cancelled().is_cancelled());
        assert!(!Error::encoder_failed("broken pipe").is_cancelled());
        assert!(!Error::tool_not_found("ffmpeg").is_cancelled());
    }

    #[test]
    fn display_includes_diagnostic() {
        let err = Error::encoder_failed("x264 rejected frame");
        assert!(err.to_string().contains("x264 rejected frame"));
    }
}
