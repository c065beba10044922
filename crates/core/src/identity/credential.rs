//! Ambient identity used when no shared key is configured.

use std::fmt;

use async_trait::async_trait;
use http::header::AUTHORIZATION;
use http::request::Parts;
use reqsign::azure::{DefaultSigner, default_signer};
use tracing::debug;

use super::error::IdentityError;

/// Resource every token is requested for.
pub const STORAGE_RESOURCE: &str = "https://storage.azure.com/";

/// Source of bearer tokens for Azure Storage data-plane calls.
#[async_trait]
pub trait TokenCredential: Send + Sync {
    /// Returns a bearer token for the storage resource.
    async fn get_token(&self) -> Result<String, IdentityError>;
}

/// Environment, workload identity, managed identity and Azure CLI credentials,
/// tried in that order by `reqsign`'s default provider. Tokens are cached by
/// the signer until shortly before they lapse.
pub struct AmbientCredential {
    signer: DefaultSigner,
}

impl AmbientCredential {
    /// Build the provider chain from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            signer: default_signer(),
        }
    }
}

impl fmt::Debug for AmbientCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AmbientCredential").finish_non_exhaustive()
    }
}

#[async_trait]
impl TokenCredential for AmbientCredential {
    async fn get_token(&self) -> Result<String, IdentityError> {
        let (mut parts, ()) = http::Request::builder()
            .method(http::Method::GET)
            .uri(STORAGE_RESOURCE)
            .body(())
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?
            .into_parts();

        self.signer
            .sign(&mut parts, None)
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        let token = bearer_token(&parts)?;
        debug!("Acquired storage token from ambient identity");
        Ok(token)
    }
}

/// Pull the bearer token out of a signed request.
fn bearer_token(parts: &Parts) -> Result<String, IdentityError> {
    let value = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(IdentityError::NoBearerToken)?;
    value
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .ok_or(IdentityError::NoBearerToken)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed(authorization: Option<&str>) -> Parts {
        let mut builder = http::Request::builder().uri(STORAGE_RESOURCE);
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_is_extracted() {
        assert_eq!(
            bearer_token(&signed(Some("Bearer eyJ0eXAi"))).unwrap(),
            "eyJ0eXAi"
        );
    }

    #[test]
    fn test_shared_key_header_is_not_a_token() {
        let err = bearer_token(&signed(Some("SharedKey shareacct:c2ln"))).unwrap_err();
        assert!(matches!(err, IdentityError::NoBearerToken));
    }

    #[test]
    fn test_missing_or_empty_header() {
        assert!(bearer_token(&signed(None)).is_err());
        assert!(bearer_token(&signed(Some("Bearer "))).is_err());
    }
}
