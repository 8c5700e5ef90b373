use std::path::PathBuf;
use thiserror::Error;

/// The main error type for driver operations.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("model_id is required")]
    MissingRepoId,

    #[error("unsupported resource_type: {0}")]
    UnsupportedResourceKind(String),

    #[error("Failed to parse driver config from {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid driver config: {0}")]
    ConfigValue(#[source] serde_json::Error),

    #[error("invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("request cancelled")]
    Cancelled,

    #[error("request to {url} returned status code {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("modelscope api error: {message} (RequestId: {request_id})")]
    Remote { message: String, request_id: String },

    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to get download link from {url}: Location header not found")]
    MissingLocation { url: String },

    #[error("not implemented: {operation}")]
    NotImplemented { operation: &'static str },

    #[error("Unknown driver: {0}")]
    UnknownDriver(String),

    #[error("{operation}: all strategies failed")]
    Exhausted { operation: &'static str },
}

impl DriverError {
    /// HTTP status carried by this error, if it came from a non-success response.
    pub fn status(&self) -> Option<u16> {
        match self {
            DriverError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the caller asked to stop; cascades must not continue past this.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DriverError::Cancelled)
    }
}
