//! Azure Blob Storage access for uploaded files.
//!
//! Talks to the Blob REST API directly and signs read links locally.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    ObjectStore (trait)                           │
//! │        put_object(name, bytes)  │  issue_scoped_credential()     │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ AzureBlobStore                                                   │
//! │   BlobServiceClient  (SharedKey or Bearer request auth)          │
//! │   SasSigner          (Service SAS or User Delegation SAS)        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Exactly one signing identity is active per store. With an account key,
//! requests carry `SharedKey` authorization and SAS tokens are signed with
//! the key. Without one, requests carry an Entra ID bearer token and every
//! SAS is signed with a user delegation key fetched for its window.

mod client;
mod config;
mod error;
mod sas;
mod service;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{API_VERSION, encode_blob_name};
pub use config::{StorageAuth, StorageConfig};
pub use error::StorageError;
pub use sas::{
    BlobSasPermissions, SAS_VERSION, ScopedCredential, SigningMode, ValidityWindow,
    format_sas_time,
};
pub use service::{AzureBlobStore, ContainerStatus, ObjectStore};
