//! reqwest-backed transport.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use vimeo_common::{Error, Result};

use super::{interpret, ApiResponse, Transport};
use crate::request::PreparedRequest;

/// Transport that performs real HTTP requests.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    /// Create a transport with a fresh connection pool.
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self::with_client(http))
    }

    /// Reuse an existing reqwest client.
    pub fn with_client(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: PreparedRequest) -> Result<ApiResponse> {
        let PreparedRequest {
            method,
            url,
            headers,
            body,
            ..
        } = request;

        debug!(%method, %url, "sending request");

        let mut builder = self.http.request(method.clone(), url.clone()).headers(headers);
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Network(format!("{} {} failed: {}", method, url, e)))?;

        let status = response.status();
        let headers = response.headers().clone();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Network(format!("Failed to read response body: {}", e)))?;

        debug!(%method, %url, status = status.as_u16(), "received response");

        interpret(status, headers, text)
    }
}
