//! glview Core - Foundational types for the glview model viewer
//!
//! This crate provides the types that all other glview crates depend on:
//! - `ViewerError` - User-facing and ambient error kinds, plus the `Result` alias
//! - `ContentHash` - SHA-256 digest of uploaded model bytes
//! - Upload limits (`MAX_UPLOAD_BYTES`, `ACCEPTED_EXTENSION`)
//! - `ViewerConfig` - Layered configuration

mod config;
mod error;
mod hash;
mod limits;

pub use config::{EnvironmentPreset, ViewerConfig};
pub use error::{Result, ViewerError};
pub use hash::ContentHash;
pub use limits::{format_size, has_accepted_extension, ACCEPTED_EXTENSION, MAX_UPLOAD_BYTES};
