//! Client error types.

use transport::TransportError;

/// Errors surfaced by the widget client.
///
/// Mapping unavailability and unmapped required columns are not errors;
/// they travel as `None` sentinels through the cache and the projector.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("host call '{endpoint}' failed: {message}")]
    HostCall { endpoint: String, message: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    /// Create a host-call error
    pub fn host_call(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::HostCall {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
