//! Common types used throughout the Vimeo client.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Scope requested when the caller does not name any.
pub const DEFAULT_SCOPE: &str = "public";

/// URI of a video resource, as returned by the API (e.g. `/videos/12345`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoUri(String);

impl VideoUri {
    /// Create a new VideoUri from a string.
    ///
    /// # Errors
    /// - Returns error if uri is empty
    pub fn new(uri: impl Into<String>) -> crate::Result<Self> {
        let uri = uri.into();
        if uri.is_empty() {
            return Err(crate::Error::InvalidInput(
                "VideoUri cannot be empty".to_string(),
            ));
        }
        Ok(Self(uri))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Trailing numeric id, if the URI ends in one.
    pub fn id(&self) -> Option<u64> {
        self.0.rsplit('/').next().and_then(|s| s.parse().ok())
    }
}

impl fmt::Display for VideoUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An ordered set of OAuth scopes.
///
/// Scopes can be given either as a list or as a single space-separated
/// string; both render to the same space-separated form. An empty set
/// renders as [`DEFAULT_SCOPE`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scopes(Vec<String>);

impl Scopes {
    /// The scopes, in the order given.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Space-separated rendering used on the wire.
    pub fn to_param(&self) -> String {
        if self.0.is_empty() {
            DEFAULT_SCOPE.to_string()
        } else {
            self.0.join(" ")
        }
    }
}

impl fmt::Display for Scopes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_param())
    }
}

impl From<&str> for Scopes {
    fn from(s: &str) -> Self {
        Self(s.split_whitespace().map(String::from).collect())
    }
}

impl From<String> for Scopes {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<Vec<String>> for Scopes {
    fn from(v: Vec<String>) -> Self {
        Self(v.into_iter().filter(|s| !s.is_empty()).collect())
    }
}

impl From<&[&str]> for Scopes {
    fn from(v: &[&str]) -> Self {
        Self(v.iter().filter(|s| !s.is_empty()).map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Scopes {
    fn from(v: [&str; N]) -> Self {
        Self::from(&v[..])
    }
}

impl<T: Into<Scopes>> From<Option<T>> for Scopes {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or_default()
    }
}
