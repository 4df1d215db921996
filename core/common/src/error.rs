//! Common error types for the Vimeo client.

use thiserror::Error;

/// Top-level error type for Vimeo API operations.
///
/// Server-side failures are forwarded as received: the status code,
/// response headers and raw body all stay available to the caller.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The file handed to an upload could not be stat'ed.
    #[error("Unable to locate file to upload.")]
    FileNotFound(String),

    /// The request never produced a response.
    #[error("Network error: {0}")]
    Network(String),

    /// The API answered with an error status.
    #[error("{body}")]
    Api {
        status: u16,
        headers: Vec<(String, String)>,
        body: String,
    },

    /// The API answered successfully but the body was not JSON.
    #[error("Failed to parse response: {message}")]
    Parse {
        status: u16,
        headers: Vec<(String, String)>,
        body: String,
        message: String,
    },

    /// Requesting an upload ticket failed.
    #[error("Unable to initiate an upload. [{0}]")]
    UploadInit(Box<Error>),

    /// Transferring file bytes failed after all retries.
    #[error("Upload error: {0}")]
    Upload(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// HTTP status carried by this error, if the server responded.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } | Error::Parse { status, .. } => Some(*status),
            Error::UploadInit(inner) => inner.status(),
            _ => None,
        }
    }

    /// Response headers carried by this error, if the server responded.
    pub fn headers(&self) -> Option<&[(String, String)]> {
        match self {
            Error::Api { headers, .. } | Error::Parse { headers, .. } => Some(headers),
            Error::UploadInit(inner) => inner.headers(),
            _ => None,
        }
    }

    /// Whether a resumable transfer should try again after this error.
    ///
    /// Connection failures are retried, as are 409 (offset mismatch),
    /// 423 (locked) and any server error. Other client errors are final.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Network(_) => true,
            Error::Api { status, .. } => matches!(*status, 409 | 423) || *status >= 500,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16) -> Error {
        Error::Api {
            status,
            headers: vec![("x-request-id".to_string(), "abc".to_string())],
            body: "{\"error\":\"nope\"}".to_string(),
        }
    }

    #[test]
    fn test_file_not_found_message() {
        let err = Error::FileNotFound("/real/file".to_string());
        assert_eq!(err.to_string(), "Unable to locate file to upload.");
    }

    #[test]
    fn test_upload_init_wraps_inner_message() {
        let err = Error::UploadInit(Box::new(Error::Network("Request Error".to_string())));
        assert_eq!(
            err.to_string(),
            "Unable to initiate an upload. [Network error: Request Error]"
        );
    }

    #[test]
    fn test_api_error_displays_raw_body() {
        assert_eq!(api(400).to_string(), "{\"error\":\"nope\"}");
    }

    #[test]
    fn test_status_and_headers_survive_wrapping() {
        let err = Error::UploadInit(Box::new(api(401)));
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.headers().unwrap()[0].1, "abc");
        assert_eq!(Error::Network("down".to_string()).status(), None);
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(Error::Network("reset".to_string()).is_retryable());
        assert!(api(409).is_retryable());
        assert!(api(423).is_retryable());
        assert!(api(502).is_retryable());
        assert!(!api(404).is_retryable());
        assert!(!api(403).is_retryable());
        assert!(!Error::Upload("gave up".to_string()).is_retryable());
    }
}
