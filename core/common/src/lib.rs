//! Common utilities and types shared across the Vimeo client crates.
//!
//! This module provides the error type every operation reports through,
//! plus the small value types that travel between the request builder,
//! the OAuth helpers and the uploader.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{Scopes, VideoUri, DEFAULT_SCOPE};
