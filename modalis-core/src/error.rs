//! Error types for modalis-core

use thiserror::Error;

/// Main error type for the modalis-core library
#[derive(Error, Debug)]
pub enum Error {
    /// A required field on a write was missing or malformed
    #[error("validation error: {0}")]
    Validation(String),

    /// A required parameter on a read was absent
    #[error("missing parameter: {0}")]
    MissingParameter(String),

    /// Modality selector outside the recognized set
    #[error("invalid modality: {0}")]
    InvalidModality(String),

    /// The insight store or roster provider could not be reached
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::StoreUnavailable(format!("database error: {}", err))
    }
}

impl Error {
    /// Stable machine-readable name for this error.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation_error",
            Error::MissingParameter(_) => "missing_parameter",
            Error::InvalidModality(_) => "invalid_modality",
            Error::StoreUnavailable(_) => "store_unavailable",
            Error::Io(_) => "io_error",
            Error::Json(_) => "json_error",
            Error::Config(_) => "config_error",
        }
    }

    /// HTTP-equivalent status code for transports that need one.
    pub fn status(&self) -> u16 {
        match self {
            Error::Validation(_) | Error::MissingParameter(_) | Error::InvalidModality(_) => 400,
            Error::StoreUnavailable(_) => 503,
            _ => 500,
        }
    }

    /// Whether a caller may retry the request (with its own backoff).
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::StoreUnavailable(_))
    }
}

/// Result type alias for modalis-core
pub type Result<T> = std::result::Result<T, Error>;
