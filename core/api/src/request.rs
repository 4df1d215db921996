//! Request options and their resolution into wire requests.

use bytes::Bytes;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE,
    USER_AGENT,
};
use reqwest::Method;
use serde_json::{Map, Value};
use url::Url;

use vimeo_common::{Error, Result};

use crate::auth::Credentials;
use crate::config::{default_port, normalize_protocol, ClientConfig};
use crate::query;

/// Content type for JSON request bodies.
pub const JSON_CONTENT_TYPE: &str = "application/json";
/// Content type for form-encoded request bodies.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// What the caller wants to send.
///
/// Unset fields fall back to the client configuration when the options
/// are resolved. `query` holds the parameters: they go into the URL for
/// GET requests and into the body for POST/PATCH/PUT/DELETE.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    /// HTTP method (GET when unset).
    pub method: Option<Method>,
    /// `http` or `https`.
    pub protocol: Option<String>,
    /// API hostname.
    pub hostname: Option<String>,
    /// API port.
    pub port: Option<u16>,
    /// API path, optionally carrying its own query string.
    pub path: String,
    /// Request parameters, as a JSON object.
    pub query: Value,
    /// Extra headers. These override the defaults.
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    /// Create options for `method` on `path`.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method: Some(method),
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Replace the request parameters.
    pub fn with_query(mut self, query: Value) -> Self {
        self.query = query;
        self
    }

    /// Set a single request parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        if !self.query.is_object() {
            self.query = Value::Object(Map::new());
        }
        if let Value::Object(map) = &mut self.query {
            map.insert(key.into(), value.into());
        }
        self
    }

    /// Add a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Resolve against configuration and credentials into a wire request.
    ///
    /// # Errors
    /// - Empty path
    /// - Unsupported protocol
    /// - Non-object parameters
    /// - Header names or values that are not valid HTTP
    pub fn resolve(
        self,
        config: &ClientConfig,
        credentials: &Credentials,
    ) -> Result<PreparedRequest> {
        if self.path.is_empty() {
            return Err(Error::InvalidInput(
                "You must provide an API path.".to_string(),
            ));
        }

        let mut path = if self.path.starts_with('/') {
            self.path
        } else {
            format!("/{}", self.path)
        };

        let protocol =
            normalize_protocol(self.protocol.as_deref().unwrap_or(&config.protocol))?;
        let hostname = self.hostname.unwrap_or_else(|| config.hostname.clone());
        let port = match (self.port, &self.protocol) {
            (Some(port), _) => port,
            // An explicit protocol without a port gets that protocol's port
            (None, Some(_)) => default_port(protocol).unwrap_or(config.port),
            (None, None) => config.port,
        };
        let method = self.method.unwrap_or(Method::GET);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, header_value(&config.accept)?);
        headers.insert(USER_AGENT, header_value(&config.user_agent)?);
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::InvalidInput(format!("Invalid header name {}: {}", name, e)))?;
            headers.insert(name, header_value(value)?);
        }
        if let Some(authorization) = credentials.authorization_header() {
            headers.insert(AUTHORIZATION, header_value(&authorization)?);
        }

        let query = match self.query {
            Value::Null => Value::Object(Map::new()),
            q @ Value::Object(_) => q,
            _ => {
                return Err(Error::InvalidInput(
                    "Request parameters must be an object".to_string(),
                ))
            }
        };

        let mut body = None;
        if carries_body(&method) {
            if !headers.contains_key(CONTENT_TYPE) {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
            }
            let is_json = headers
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|ct| ct.starts_with(JSON_CONTENT_TYPE));
            let has_params = query.as_object().is_some_and(|map| !map.is_empty());
            let encoded = match (has_params, is_json) {
                (false, _) => String::new(),
                (true, true) => serde_json::to_string(&query)?,
                (true, false) => query::stringify(&query),
            };
            headers.insert(CONTENT_LENGTH, HeaderValue::from(encoded.len()));
            if !encoded.is_empty() {
                body = Some(Bytes::from(encoded));
            }
        } else if method == Method::GET {
            path = query::append_to_path(&path, &query);
        }

        let url = Url::parse(&format!("{}://{}:{}{}", protocol, hostname, port, path))
            .map_err(|e| Error::InvalidInput(format!("Invalid request URL: {}", e)))?;

        Ok(PreparedRequest {
            method,
            url,
            headers,
            query,
            body,
        })
    }
}

impl From<&str> for RequestOptions {
    /// A bare path is a GET; any `?a=b` suffix becomes the parameters.
    fn from(path: &str) -> Self {
        let (path, params) = query::split_path(path);
        Self::get(path).with_query(Value::Object(params))
    }
}

impl From<String> for RequestOptions {
    fn from(path: String) -> Self {
        Self::from(path.as_str())
    }
}

/// A fully resolved request, ready for a [`Transport`](crate::Transport).
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    /// The parameters the request was built from.
    pub query: Value,
    pub body: Option<Bytes>,
}

impl PreparedRequest {
    /// A bare request with no headers or body.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            query: Value::Object(Map::new()),
            body: None,
        }
    }

    /// Add or replace a header.
    pub fn with_header(mut self, name: HeaderName, value: &str) -> Result<Self> {
        self.headers.insert(name, header_value(value)?);
        Ok(self)
    }

    /// Attach a body, setting `Content-Length` to match.
    pub fn with_body(mut self, body: Bytes) -> Self {
        self.headers.insert(CONTENT_LENGTH, HeaderValue::from(body.len()));
        self.body = Some(body);
        self
    }

    /// Header value as text.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Body as UTF-8 text, if any.
    pub fn body_text(&self) -> Option<&str> {
        self.body
            .as_ref()
            .and_then(|b| std::str::from_utf8(b).ok())
    }

    /// Path plus query string, as sent on the request line.
    pub fn path_and_query(&self) -> String {
        match self.url.query() {
            Some(q) => format!("{}?{}", self.url.path(), q),
            None => self.url.path().to_string(),
        }
    }
}

fn carries_body(method: &Method) -> bool {
    [Method::POST, Method::PATCH, Method::PUT, Method::DELETE].contains(method)
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| Error::InvalidInput(format!("Invalid header value: {}", e)))
}
