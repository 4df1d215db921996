//! HTTP transport abstraction.
//!
//! Every request the client makes, API calls and tus transfers alike,
//! goes through a [`Transport`]. [`HttpTransport`] is the real network
//! implementation; [`MockTransport`] records requests and replays
//! scripted responses.

mod http;
mod mock;

pub use self::http::HttpTransport;
pub use self::mock::MockTransport;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

use vimeo_common::{Error, Result};

use crate::request::PreparedRequest;

/// A successful (status < 400) response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Parsed JSON body. An empty body parses as `{}`.
    pub body: Value,
}

impl ApiResponse {
    /// Create a response with no headers.
    pub fn new(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body,
        }
    }

    /// Add a header. Invalid names or values are skipped.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Header value as text.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Decode the body into a typed value.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.body.clone())
            .map_err(|e| Error::Serialization(format!("Failed to decode response body: {}", e)))
    }
}

/// Something that can execute a [`PreparedRequest`].
///
/// Implementations report status >= 400 as [`Error::Api`] carrying the
/// status, headers and raw body, and a non-JSON success body as
/// [`Error::Parse`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and wait for the whole response.
    async fn send(&self, request: PreparedRequest) -> Result<ApiResponse>;
}

/// Flatten headers into owned pairs for error reporting.
pub(crate) fn header_pairs(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(k, v)| {
            (
                k.as_str().to_string(),
                String::from_utf8_lossy(v.as_bytes()).into_owned(),
            )
        })
        .collect()
}

/// Turn a status and raw body into the outcome a [`Transport`] reports.
pub(crate) fn interpret(
    status: StatusCode,
    headers: HeaderMap,
    body: String,
) -> Result<ApiResponse> {
    if status.as_u16() >= 400 {
        return Err(Error::Api {
            status: status.as_u16(),
            headers: header_pairs(&headers),
            body,
        });
    }

    let parsed = if body.trim().is_empty() {
        Value::Object(Default::default())
    } else {
        match serde_json::from_str(&body) {
            Ok(value) => value,
            Err(e) => {
                return Err(Error::Parse {
                    status: status.as_u16(),
                    headers: header_pairs(&headers),
                    body,
                    message: e.to_string(),
                })
            }
        }
    };

    Ok(ApiResponse {
        status,
        headers,
        body: parsed,
    })
}
