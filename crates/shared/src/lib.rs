//! Shared errors and configuration for ShareSafely.
//!
//! This crate provides common types used across all other crates:
//! - Application-wide error types and their HTTP mapping
//! - Configuration management (files, `SHARESAFELY__*` and the plain Azure variables)

pub mod config;
pub mod error;

pub use config::{
    AppConfig, LogFormat, MAX_SAS_TTL_MINUTES, MIN_SAS_TTL_MINUTES, ServerConfig, StorageSettings,
};
pub use error::{AppError, AppResult};
