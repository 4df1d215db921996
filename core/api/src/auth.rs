//! OAuth2 authorization and token exchange.

use base64::{engine::general_purpose::STANDARD, Engine};
use oauth2::{AccessToken, ClientId, ClientSecret, CsrfToken};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::debug;

use vimeo_common::{Result, Scopes};

use crate::client::Vimeo;
use crate::query;
use crate::request::{RequestOptions, FORM_CONTENT_TYPE};
use crate::transport::ApiResponse;

/// Where users are sent to approve an application.
pub const AUTHORIZATION_PATH: &str = "/oauth/authorize";
/// Exchanges an authorization code for an access token.
pub const ACCESS_TOKEN_PATH: &str = "/oauth/access_token";
/// Issues unauthenticated (application-only) tokens.
pub const CLIENT_CREDENTIALS_PATH: &str = "/oauth/authorize/client";

/// Application credentials plus an optional user token.
///
/// Empty strings count as absent. Secrets are redacted in `Debug`.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    client_id: Option<ClientId>,
    client_secret: Option<ClientSecret>,
    access_token: Option<AccessToken>,
}

impl Credentials {
    /// Create credentials from an application's id and secret.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        let client_id = client_id.into();
        let client_secret = client_secret.into();
        Self {
            client_id: (!client_id.is_empty()).then(|| ClientId::new(client_id)),
            client_secret: (!client_secret.is_empty()).then(|| ClientSecret::new(client_secret)),
            access_token: None,
        }
    }

    /// Attach an access token.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.set_access_token(token);
        self
    }

    /// Replace the access token. An empty token clears it.
    pub fn set_access_token(&mut self, token: impl Into<String>) {
        let token = token.into();
        self.access_token = (!token.is_empty()).then(|| AccessToken::new(token));
    }

    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_ref().map(|id| id.as_str())
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_ref().map(|t| t.secret().as_str())
    }

    /// `Authorization` header value for these credentials.
    ///
    /// A token wins over the id/secret pair. Without either, requests go
    /// out unauthenticated.
    pub fn authorization_header(&self) -> Option<String> {
        if let Some(token) = &self.access_token {
            return Some(format!("Bearer {}", token.secret()));
        }
        match (&self.client_id, &self.client_secret) {
            (Some(id), Some(secret)) => {
                let pair = format!("{}:{}", id.as_str(), secret.secret());
                Some(format!("Basic {}", STANDARD.encode(pair)))
            }
            _ => None,
        }
    }
}

/// Body of a successful token response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    /// Authorized user, present for authorization-code grants.
    #[serde(default)]
    pub user: Option<Value>,
}

impl TokenGrant {
    /// Decode a token response.
    pub fn from_response(response: &ApiResponse) -> Result<Self> {
        response.json()
    }
}

impl Vimeo {
    /// Build the URL users visit to authorize this application.
    ///
    /// Scopes default to `public`; several scopes are sent space-separated.
    /// `state` is echoed back on the redirect and should be checked there.
    pub fn build_authorization_endpoint(
        &self,
        redirect_uri: &str,
        scopes: impl Into<Scopes>,
        state: Option<&str>,
    ) -> String {
        let scopes: Scopes = scopes.into();
        let mut params = Map::new();
        params.insert("response_type".to_string(), json!("code"));
        params.insert(
            "client_id".to_string(),
            json!(self.credentials().client_id().unwrap_or_default()),
        );
        params.insert("redirect_uri".to_string(), json!(redirect_uri));
        params.insert("scope".to_string(), json!(scopes.to_param()));
        if let Some(state) = state.filter(|s| !s.is_empty()) {
            params.insert("state".to_string(), json!(state));
        }

        format!(
            "{}{}?{}",
            self.config().base_url(),
            AUTHORIZATION_PATH,
            query::stringify(&Value::Object(params))
        )
    }

    /// Like [`build_authorization_endpoint`](Self::build_authorization_endpoint)
    /// with a freshly generated random `state`, returned alongside the URL.
    pub fn build_authorization_endpoint_with_random_state(
        &self,
        redirect_uri: &str,
        scopes: impl Into<Scopes>,
    ) -> (String, String) {
        let csrf = CsrfToken::new_random();
        let state = csrf.secret().clone();
        let url = self.build_authorization_endpoint(redirect_uri, scopes, Some(&state));
        (url, state)
    }

    /// Request an application-only access token.
    ///
    /// # Errors
    /// Whatever the transport reports; an error response keeps its
    /// status and headers.
    pub async fn generate_client_credentials(
        &self,
        scopes: impl Into<Scopes>,
    ) -> Result<ApiResponse> {
        let scopes: Scopes = scopes.into();
        debug!(scope = %scopes, "requesting client credentials");

        let options = RequestOptions::post(CLIENT_CREDENTIALS_PATH)
            .with_hostname(self.config().hostname.clone())
            .with_query(json!({
                "grant_type": "client_credentials",
                "scope": scopes.to_param(),
            }))
            .with_header("Content-Type", FORM_CONTENT_TYPE);

        self.request(options).await
    }

    /// Exchange an authorization code for an access token.
    ///
    /// `redirect_uri` must match the one used to build the authorization URL.
    pub async fn access_token_for_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<ApiResponse> {
        debug!("exchanging authorization code");

        let options = RequestOptions::post(ACCESS_TOKEN_PATH)
            .with_hostname(self.config().hostname.clone())
            .with_query(json!({
                "grant_type": "authorization_code",
                "code": code,
                "redirect_uri": redirect_uri,
            }))
            .with_header("Content-Type", FORM_CONTENT_TYPE);

        self.request(options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use reqwest::{Method, StatusCode};
    use std::sync::Arc;
    use vimeo_common::Error;

    const REDIRECT_URL: &str = "https://myapp.com/login";

    fn client(mock: &MockTransport) -> Vimeo {
        Vimeo::new("id", "secret", Some("token"))
            .unwrap()
            .with_transport(Arc::new(mock.clone()))
    }

    fn failing(mock: &MockTransport) {
        mock.push(Err(Error::Api {
            status: 401,
            headers: vec![("www-authenticate".to_string(), "Bearer".to_string())],
            body: "Request Error".to_string(),
        }));
    }

    #[test]
    fn test_authorization_endpoint_defaults_to_public_scope() {
        let vimeo = client(&MockTransport::new());
        let url = vimeo.build_authorization_endpoint(REDIRECT_URL, None::<&str>, None);
        assert!(url.starts_with("https://api.vimeo.com/oauth/authorize?"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("client_id=id"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Fmyapp.com%2Flogin"));
        assert!(url.contains("scope=public"));
        assert!(!url.contains("state="));
    }

    #[test]
    fn test_authorization_endpoint_scope_list() {
        let vimeo = client(&MockTransport::new());
        let url = vimeo.build_authorization_endpoint(REDIRECT_URL, ["scope1", "scope2"], None);
        assert!(url.contains("scope=scope1%20scope2"));

        let url = vimeo.build_authorization_endpoint(REDIRECT_URL, "scope1 scope2", None);
        assert!(url.contains("scope=scope1%20scope2"));
    }

    #[test]
    fn test_authorization_endpoint_state() {
        let vimeo = client(&MockTransport::new());
        let url = vimeo.build_authorization_endpoint(REDIRECT_URL, "scope", Some("state"));
        assert!(url.ends_with("scope=scope&state=state"));
    }

    #[test]
    fn test_authorization_endpoint_random_state() {
        let vimeo = client(&MockTransport::new());
        let (url, state) =
            vimeo.build_authorization_endpoint_with_random_state(REDIRECT_URL, "public");
        assert!(!state.is_empty());
        assert!(url.contains(&format!("state={}", query::escape(&state))));
    }

    #[tokio::test]
    async fn test_client_credentials_request() {
        let mock = MockTransport::new();
        client(&mock)
            .generate_client_credentials(None::<&str>)
            .await
            .unwrap();

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        let sent = &requests[0];
        assert_eq!(sent.method, Method::POST);
        assert_eq!(sent.url.host_str(), Some("api.vimeo.com"));
        assert_eq!(sent.url.path(), CLIENT_CREDENTIALS_PATH);
        assert_eq!(sent.query["grant_type"], "client_credentials");
        assert_eq!(sent.query["scope"], "public");
        assert_eq!(sent.header("content-type"), Some(FORM_CONTENT_TYPE));
        assert_eq!(
            sent.body_text(),
            Some("grant_type=client_credentials&scope=public")
        );
    }

    #[tokio::test]
    async fn test_client_credentials_scope_list() {
        let mock = MockTransport::new();
        let vimeo = client(&mock);
        vimeo
            .generate_client_credentials(["scope1", "scope2"])
            .await
            .unwrap();
        vimeo
            .generate_client_credentials("scope1 scope2")
            .await
            .unwrap();

        for sent in mock.requests() {
            assert_eq!(sent.query["scope"], "scope1 scope2");
        }
    }

    #[tokio::test]
    async fn test_client_credentials_success_is_forwarded() {
        let mock = MockTransport::new();
        mock.push(Ok(ApiResponse::new(
            StatusCode::OK,
            json!({ "access_token": "abc", "token_type": "bearer", "scope": "public" }),
        )
        .with_header("x-ratelimit-remaining", "99")));

        let resp = client(&mock)
            .generate_client_credentials("public")
            .await
            .unwrap();
        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(resp.header("x-ratelimit-remaining"), Some("99"));

        let grant = TokenGrant::from_response(&resp).unwrap();
        assert_eq!(grant.access_token, "abc");
        assert_eq!(grant.scope.as_deref(), Some("public"));
    }

    #[tokio::test]
    async fn test_client_credentials_error_is_forwarded() {
        let mock = MockTransport::new();
        failing(&mock);

        let err = client(&mock)
            .generate_client_credentials("scope")
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.headers().unwrap()[0].0, "www-authenticate");
        assert_eq!(err.to_string(), "Request Error");
    }

    #[tokio::test]
    async fn test_access_token_request() {
        let mock = MockTransport::new();
        client(&mock)
            .access_token_for_code("code", "redirectURI")
            .await
            .unwrap();

        let sent = &mock.requests()[0];
        assert_eq!(sent.method, Method::POST);
        assert_eq!(sent.url.host_str(), Some("api.vimeo.com"));
        assert_eq!(sent.url.path(), ACCESS_TOKEN_PATH);
        assert_eq!(
            sent.query,
            json!({
                "grant_type": "authorization_code",
                "code": "code",
                "redirect_uri": "redirectURI"
            })
        );
        assert_eq!(sent.header("content-type"), Some(FORM_CONTENT_TYPE));
    }

    #[tokio::test]
    async fn test_access_token_error_is_forwarded() {
        let mock = MockTransport::new();
        failing(&mock);

        let err = client(&mock)
            .access_token_for_code("code", "redirectURI")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Api { status: 401, .. }));
    }

    #[test]
    fn test_credentials_header_preference() {
        let creds = Credentials::new("id", "secret");
        assert!(creds.authorization_header().unwrap().starts_with("Basic "));

        let creds = creds.with_access_token("token");
        assert_eq!(creds.authorization_header().as_deref(), Some("Bearer token"));

        assert_eq!(Credentials::default().authorization_header(), None);
    }
}
