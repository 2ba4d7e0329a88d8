//! Transport error types.

use thiserror::Error;

/// Main transport error type
#[derive(Error, Debug)]
pub enum TransportError {
    /// Channel-level failures (send/receive on a bound channel)
    #[error("channel error: {message}")]
    Channel { message: String },

    /// Environment detection and binding failures
    #[error("environment error: {message}")]
    Environment { message: String },

    /// Frame exceeds the protocol's size cap
    #[error("frame too large: {size} bytes exceeds limit of {limit}")]
    FrameTooLarge { size: usize, limit: usize },

    /// Peer closed the channel
    #[error("channel closed by peer")]
    Closed,

    /// Transport timeout errors
    #[error("timeout: {operation} exceeded {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    /// Generic I/O errors
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for transport operations
pub type Result<T> = std::result::Result<T, TransportError>;

impl TransportError {
    /// Create a channel error
    pub fn channel(message: impl Into<String>) -> Self {
        Self::Channel {
            message: message.into(),
        }
    }

    /// Create an environment error
    pub fn environment(message: impl Into<String>) -> Self {
        Self::Environment {
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    /// Get error category for diagnostics
    pub fn category(&self) -> &'static str {
        match self {
            TransportError::Channel { .. } => "channel",
            TransportError::Environment { .. } => "environment",
            TransportError::FrameTooLarge { .. } => "frame_too_large",
            TransportError::Closed => "closed",
            TransportError::Timeout { .. } => "timeout",
            TransportError::Io { .. } => "io",
        }
    }

    /// Whether this error means the peer is gone rather than a bad call
    pub fn is_disconnect(&self) -> bool {
        matches!(self, TransportError::Closed)
            || matches!(
                self,
                TransportError::Io { source, .. }
                    if source.kind() == std::io::ErrorKind::BrokenPipe
                        || source.kind() == std::io::ErrorKind::ConnectionReset
            )
    }
}

impl From<std::io::Error> for TransportError {
    fn from(error: std::io::Error) -> Self {
        TransportError::Io {
            message: error.to_string(),
            source: error,
        }
    }
}
