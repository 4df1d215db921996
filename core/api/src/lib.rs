//! Client library for the Vimeo REST API.
//!
//! This crate provides:
//! - Request construction (default headers, credentials, query/body encoding)
//! - OAuth2 helpers (authorization URL, client credentials, code exchange)
//! - Resumable video uploads over the tus protocol
//!
//! # Design Principles
//! - Pass-through errors: server failures keep their status, headers and body
//! - Pluggable transport: all HTTP goes through the [`Transport`] trait
//! - Async operations: all I/O operations are async

pub mod auth;
pub mod client;
pub mod config;
pub mod query;
pub mod request;
pub mod transport;
pub mod upload;

pub use auth::{
    Credentials, TokenGrant, ACCESS_TOKEN_PATH, AUTHORIZATION_PATH, CLIENT_CREDENTIALS_PATH,
};
pub use client::Vimeo;
pub use config::ClientConfig;
pub use request::{PreparedRequest, RequestOptions};
pub use transport::{ApiResponse, HttpTransport, MockTransport, Transport};
pub use upload::{RetryPolicy, TusUpload, UploadDetails, UploadTicket, UPLOAD_PATH};

pub use vimeo_common::{Error, Result, Scopes, VideoUri};
