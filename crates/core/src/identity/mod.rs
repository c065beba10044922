//! Entra ID (Azure AD) identity for the delegated signing path.
//!
//! Token acquisition is delegated to `reqsign`'s Azure Storage provider chain:
//! client secret or federated token from `AZURE_*` variables, then managed
//! identity, then the Azure CLI.

mod credential;
mod error;

pub use credential::{AmbientCredential, STORAGE_RESOURCE, TokenCredential};
pub use error::IdentityError;
