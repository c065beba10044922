//! Shareable link issuance.
//!
//! A link is the blob URL plus a freshly signed, read-only SAS. Nothing is
//! cached: every call signs a new credential for a new window.

mod error;
mod service;

pub use error::LinkError;
pub use service::{IssuedLink, LinkService};
