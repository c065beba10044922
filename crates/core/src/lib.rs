//! Core logic for ShareSafely.
//!
//! This crate holds everything between the HTTP layer and Azure: it has
//! ZERO web framework dependencies.
//!
//! # Modules
//!
//! - `identity` - Entra ID bearer tokens for the delegated signing path
//! - `storage` - Blob REST client, SAS signing and the `ObjectStore` seam
//! - `link` - Time-limited read link issuance
//! - `upload` - Filename sanitization, object naming and size ceiling

pub mod identity;
pub mod link;
pub mod storage;
pub mod upload;
