//! Error types for the pcloudlib library.

use std::path::PathBuf;

use thiserror::Error;

use crate::api::ApiErrorCode;

/// Main error type for pcloudlib operations.
#[derive(Error, Debug)]
pub enum PCloudError {
    /// HTTP request failed with status code.
    #[error("HTTP error: {0}")]
    HttpError(u16),

    /// Network request error.
    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Local filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// pCloud API returned a non-zero result code.
    #[error("{message} ({code})")]
    ApiError { code: u32, message: String },

    /// Response is missing a field or has an unexpected shape.
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    /// Response carried a content type we cannot decode.
    #[error("Unhandled content type: {0}")]
    UnexpectedContentType(String),

    /// Authentication was needed but a credential is not set.
    #[error("pCloud {0} is not set")]
    MissingCredentials(&'static str),

    /// Progress marker cannot be trusted as a resume offset.
    #[error("Invalid progress marker {}: {reason}", path.display())]
    InvalidProgress { path: PathBuf, reason: String },

    /// Checksum string does not match any known algorithm.
    #[error("Invalid checksum: \"{0}\"")]
    InvalidChecksum(String),

    /// Operation issued on a remote file that was already closed.
    #[error("File descriptor {0} is closed")]
    FileClosed(u64),

    /// Custom error message.
    #[error("{0}")]
    Custom(String),
}

impl PCloudError {
    /// Build an API error from a pCloud result code.
    pub fn api(code: u32) -> Self {
        PCloudError::ApiError {
            code,
            message: ApiErrorCode::from(code).description().to_string(),
        }
    }

    /// The pCloud result code, if this is an API error.
    pub fn api_code(&self) -> Option<u32> {
        match self {
            PCloudError::ApiError { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Whether the server reported "File not found".
    ///
    /// Right after a write this is usually indexing lag rather than a real miss.
    pub fn is_not_found(&self) -> bool {
        self.api_code() == Some(ApiErrorCode::FileNotFound.code())
    }
}

/// Result type alias for pcloudlib operations.
pub type Result<T> = std::result::Result<T, PCloudError>;
