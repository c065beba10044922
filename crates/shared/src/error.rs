//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Required configuration is missing or malformed. Fatal at startup.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Storage bootstrap failed. Fatal at startup.
    #[error("Initialization failed: {0}")]
    Initialization(String),

    /// Client input error.
    #[error("{0}")]
    Validation(String),

    /// Upload exceeds the configured ceiling.
    #[error("{message}")]
    PayloadTooLarge {
        /// Short description for the envelope.
        message: String,
        /// Sizes involved.
        details: String,
    },

    /// Storage backend failure, surfaced with its underlying message.
    #[error("{context}: {details}")]
    Backend {
        /// What was being attempted, e.g. "upload failed".
        context: String,
        /// Underlying backend message, passed through verbatim.
        details: String,
    },
}

impl AppError {
    /// Create a backend error with the given context.
    #[must_use]
    pub fn backend(context: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Backend {
            context: context.into(),
            details: details.into(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::PayloadTooLarge { .. } => 413,
            Self::Configuration(_)
            | Self::Initialization(_)
            | Self::Backend { .. } => 500,
        }
    }

    /// Returns the error code for logs and diagnostics.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Initialization(_) => "INITIALIZATION_ERROR",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            Self::Backend { .. } => "BACKEND_ERROR",
        }
    }

    /// Message placed in the `error` field of the response envelope.
    #[must_use]
    pub fn envelope_message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::PayloadTooLarge { message, .. } => message.clone(),
            Self::Backend { context, .. } => context.clone(),
            Self::Configuration(_) | Self::Initialization(_) => "internal error".to_string(),
        }
    }

    /// Underlying detail placed in the `details` field, if any.
    #[must_use]
    pub fn envelope_details(&self) -> Option<&str> {
        match self {
            Self::PayloadTooLarge { details, .. } | Self::Backend { details, .. } => {
                Some(details)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(AppError::Validation(String::new()).status_code(), 400);
        assert_eq!(
            AppError::PayloadTooLarge {
                message: String::new(),
                details: String::new()
            }
            .status_code(),
            413
        );
        assert_eq!(AppError::backend("upload failed", "x").status_code(), 500);
        assert_eq!(AppError::Configuration(String::new()).status_code(), 500);
        assert_eq!(AppError::Initialization(String::new()).status_code(), 500);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::Configuration(String::new()).error_code(),
            "CONFIGURATION_ERROR"
        );
        assert_eq!(
            AppError::Validation(String::new()).error_code(),
            "VALIDATION_ERROR"
        );
        assert_eq!(
            AppError::backend("SAS generation failed", "boom").error_code(),
            "BACKEND_ERROR"
        );
    }

    #[test]
    fn test_backend_envelope_passes_details_through() {
        let err = AppError::backend("upload failed", "HTTP 403 - AuthorizationFailure");
        assert_eq!(err.envelope_message(), "upload failed");
        assert_eq!(
            err.envelope_details(),
            Some("HTTP 403 - AuthorizationFailure")
        );
        assert_eq!(
            err.to_string(),
            "upload failed: HTTP 403 - AuthorizationFailure"
        );
    }

    #[test]
    fn test_validation_envelope_has_no_details() {
        let err = AppError::Validation("blobName is required".into());
        assert_eq!(err.envelope_message(), "blobName is required");
        assert_eq!(err.envelope_details(), None);
    }
}
