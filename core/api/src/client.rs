//! The API client.

use std::sync::Arc;
use tracing::{debug, warn};

use vimeo_common::Result;

use crate::auth::Credentials;
use crate::config::ClientConfig;
use crate::request::RequestOptions;
use crate::transport::{ApiResponse, HttpTransport, Transport};

/// Vimeo API client.
///
/// Holds the application credentials, an optional access token, the
/// client configuration and the transport used for every request.
pub struct Vimeo {
    credentials: Credentials,
    config: ClientConfig,
    transport: Arc<dyn Transport>,
}

impl Vimeo {
    /// Create a client talking to the production API over HTTPS.
    ///
    /// `access_token` may be `None` for applications that only use their
    /// client id and secret (Basic auth) until they obtain a token.
    ///
    /// # Errors
    /// - The HTTP client could not be initialized
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        access_token: Option<&str>,
    ) -> Result<Self> {
        let mut credentials = Credentials::new(client_id, client_secret);
        if let Some(token) = access_token {
            credentials = credentials.with_access_token(token);
        }

        Ok(Self {
            credentials,
            config: ClientConfig::default(),
            transport: Arc::new(HttpTransport::new()?),
        })
    }

    /// Replace the configuration.
    ///
    /// # Errors
    /// - The configuration fails validation
    pub fn with_config(mut self, config: ClientConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Replace the transport.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    /// Current configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Current credentials.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Set the access token used for subsequent requests.
    pub fn set_access_token(&mut self, token: impl Into<String>) {
        let token = token.into();
        if token.is_empty() {
            warn!("clearing access token; requests fall back to client credentials");
        }
        self.credentials.set_access_token(token);
    }

    /// Current access token, if any.
    pub fn access_token(&self) -> Option<&str> {
        self.credentials.access_token()
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Make an API request.
    ///
    /// Accepts full [`RequestOptions`] or a bare path (sent as GET).
    /// Failures come back as received: see [`Transport`] for how status
    /// codes map to errors.
    pub async fn request(&self, options: impl Into<RequestOptions>) -> Result<ApiResponse> {
        let prepared = options.into().resolve(&self.config, &self.credentials)?;
        debug!(method = %prepared.method, path = %prepared.url.path(), "api request");
        self.transport.send(prepared).await
    }
}

impl std::fmt::Debug for Vimeo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vimeo")
            .field("credentials", &self.credentials)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use reqwest::{Method, StatusCode};
    use serde_json::json;
    use vimeo_common::Error;

    fn client(mock: &MockTransport) -> Vimeo {
        Vimeo::new("id", "secret", Some("token"))
            .unwrap()
            .with_transport(Arc::new(mock.clone()))
    }

    #[test]
    fn test_constructor_stores_credentials() {
        let vimeo = Vimeo::new("id", "secret", Some("token")).unwrap();
        assert_eq!(vimeo.credentials().client_id(), Some("id"));
        assert_eq!(vimeo.access_token(), Some("token"));

        let anonymous = Vimeo::new("id", "secret", None).unwrap();
        assert_eq!(anonymous.access_token(), None);
    }

    #[test]
    fn test_set_access_token() {
        let mut vimeo = Vimeo::new("id", "secret", None).unwrap();
        vimeo.set_access_token("fresh");
        assert_eq!(vimeo.access_token(), Some("fresh"));
        vimeo.set_access_token("");
        assert_eq!(vimeo.access_token(), None);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let vimeo = Vimeo::new("id", "hunter2", Some("tok3n")).unwrap();
        let printed = format!("{:?}", vimeo);
        assert!(!printed.contains("hunter2"));
        assert!(!printed.contains("tok3n"));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = Vimeo::new("id", "secret", None)
            .unwrap()
            .with_config(ClientConfig::default().with_protocol("gopher"));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_request_with_bare_path() {
        let mock = MockTransport::new();
        mock.push_json(StatusCode::OK, json!({ "name": "Staff Picks" }));

        let resp = client(&mock).request("/me?fields=name").await.unwrap();
        assert_eq!(resp.body["name"], "Staff Picks");

        let sent = &mock.requests()[0];
        assert_eq!(sent.method, Method::GET);
        assert_eq!(sent.url.as_str(), "https://api.vimeo.com/me?fields=name");
        assert_eq!(sent.header("authorization"), Some("Bearer token"));
    }

    #[tokio::test]
    async fn test_request_forwards_errors_unchanged() {
        let mock = MockTransport::new();
        mock.push(Err(Error::Api {
            status: 404,
            headers: vec![("x-request-id".to_string(), "abc".to_string())],
            body: r#"{"error":"not found"}"#.to_string(),
        }));

        let err = client(&mock).request("/videos/0").await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.to_string(), r#"{"error":"not found"}"#);
    }

    #[tokio::test]
    async fn test_invalid_options_never_reach_transport() {
        let mock = MockTransport::new();
        let result = client(&mock).request(RequestOptions::default()).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_custom_config_is_used() {
        let mock = MockTransport::new();
        let config = ClientConfig::default()
            .with_base_url("http://localhost:4010")
            .unwrap();
        let vimeo = client(&mock).with_config(config).unwrap();
        vimeo
            .request(RequestOptions::patch("/videos/1").with_param("name", "x"))
            .await
            .unwrap();

        let sent = &mock.requests()[0];
        assert_eq!(sent.url.as_str(), "http://localhost:4010/videos/1");
        assert_eq!(sent.body_text(), Some(r#"{"name":"x"}"#));
    }
}
