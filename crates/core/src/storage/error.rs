//! Storage error types.

use sharesafely_shared::AppError;
use thiserror::Error;

use crate::identity::IdentityError;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Storage configuration error.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// The storage endpoint could not be reached.
    #[error("{operation} request failed: {message}")]
    Transport {
        /// Blob service operation.
        operation: &'static str,
        /// Transport error message.
        message: String,
    },

    /// The storage service rejected the request.
    #[error("{operation} failed: HTTP {status} {}: {message}", .code.as_deref().unwrap_or("UnknownError"))]
    Service {
        /// Blob service operation.
        operation: &'static str,
        /// HTTP status code.
        status: u16,
        /// Azure error code (`x-ms-error-code`), when present.
        code: Option<String>,
        /// Error message from the service.
        message: String,
    },

    /// The storage service answered with something we cannot parse.
    #[error("unexpected {operation} response: {message}")]
    UnexpectedResponse {
        /// Blob service operation.
        operation: &'static str,
        /// What was missing or malformed.
        message: String,
    },

    /// Bearer token acquisition failed.
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// Signing material was unusable.
    #[error("signing failed: {0}")]
    Signing(String),
}

impl StorageError {
    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a transport error.
    #[must_use]
    pub fn transport(operation: &'static str, msg: impl Into<String>) -> Self {
        Self::Transport {
            operation,
            message: msg.into(),
        }
    }

    /// Create an unexpected response error.
    #[must_use]
    pub fn unexpected(operation: &'static str, msg: impl Into<String>) -> Self {
        Self::UnexpectedResponse {
            operation,
            message: msg.into(),
        }
    }

    /// HTTP status returned by the service, if the error came from one.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Service { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Classify a failure during process startup.
    ///
    /// Bad configuration stays a configuration error; anything that happened
    /// while talking to the service is an initialization error.
    #[must_use]
    pub fn into_startup_error(self) -> AppError {
        match self {
            Self::Configuration(msg) => AppError::Configuration(msg),
            other => AppError::Initialization(other.to_string()),
        }
    }
}
