//! File upload: name sanitization, object naming and the size ceiling.

mod error;
mod naming;
mod service;

#[cfg(test)]
mod naming_props;

pub use error::UploadError;
pub use naming::{object_name, sanitize_filename};
pub use service::{DEFAULT_CONTENT_TYPE, IncomingFile, StoredObject, UploadService};
