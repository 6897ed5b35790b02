use thiserror::Error;

/// Result type alias for gateway operations
pub type Result<T, E = GatewayError> = std::result::Result<T, E>;

/// Errors that can occur while serving an aggregation request
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Upstream request failed for {0}: {1}")]
    UpstreamRequestFailed(String, String),

    #[error("Upstream timeout for {0}")]
    UpstreamTimeout(String),

    #[error("Failed to read response body from {0}: {1}")]
    ResponseBodyError(String, String),

    #[error("Failed to build request for {0}: {1}")]
    RequestBuildError(String, String),

    #[error("Response serialization error: {0}")]
    ResponseSerializationError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
