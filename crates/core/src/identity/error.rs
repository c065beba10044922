//! Identity error types.

use thiserror::Error;

/// Token acquisition errors.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// No identity source produced a credential.
    #[error("ambient identity unavailable: {0}")]
    Unavailable(String),

    /// A credential was found but it is not an Entra ID token.
    #[error("ambient identity did not yield a bearer token")]
    NoBearerToken,
}
