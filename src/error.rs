//! Error types surfaced to callers of the request executor.
//!
//! Every failure maps to an [`ErrorKind`]. Errors that originate from an HTTP
//! response carry an [`ApiErrorInfo`] with the status, machine code and
//! request id so callers can correlate them with server-side records.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::request::BuildError;
use crate::transport::TransportError;
use crate::webhook::SignatureVerificationError;

/// Classification of every error this library surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Transport-level failure after exhausting retries.
    Connection,
    /// Deadline exceeded.
    Timeout,
    /// HTTP 401.
    Authentication,
    /// HTTP 403.
    Permission,
    /// Other 4xx, or a request rejected before it was sent.
    InvalidRequest,
    /// HTTP 429 after exhausting retries.
    RateLimit,
    /// 5xx after exhausting retries, or an unparseable response.
    Api,
    /// HTTP 409 not resolved within the retry budget.
    Idempotency,
    /// Webhook signature missing, mismatched, or expired.
    SignatureVerification,
}

impl ErrorKind {
    /// Maps a non-success HTTP status to an error kind.
    #[must_use]
    pub fn from_status(status: http::StatusCode) -> Self {
        match status.as_u16() {
            401 => Self::Authentication,
            403 => Self::Permission,
            409 => Self::Idempotency,
            429 => Self::RateLimit,
            400..=499 => Self::InvalidRequest,
            _ => Self::Api,
        }
    }

    /// Returns the stable name of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connection => "ConnectionError",
            Self::Timeout => "TimeoutError",
            Self::Authentication => "AuthenticationError",
            Self::Permission => "PermissionError",
            Self::InvalidRequest => "InvalidRequestError",
            Self::RateLimit => "RateLimitError",
            Self::Api => "APIError",
            Self::Idempotency => "IdempotencyError",
            Self::SignatureVerification => "SignatureVerificationError",
        }
    }

    /// Returns true for classes the executor retries internally.
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(
            self,
            Self::Connection | Self::Timeout | Self::RateLimit | Self::Api | Self::Idempotency
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured description of an error returned by the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiErrorInfo {
    /// Error classification.
    pub kind: ErrorKind,
    /// Human-readable message.
    pub message: String,
    /// Machine-readable code (e.g. `resource_missing`).
    pub code: Option<String>,
    /// HTTP status of the response.
    pub http_status: Option<http::StatusCode>,
    /// Value of the `Request-Id` response header.
    pub request_id: Option<String>,
    /// The server's error `type` string (e.g. `card_error`).
    pub error_type: Option<String>,
    /// Parameter the error relates to.
    pub param: Option<String>,
    /// Card decline code, for card errors.
    pub decline_code: Option<String>,
    /// Raw response body, if it was valid UTF-8.
    pub body: Option<String>,
}

impl ApiErrorInfo {
    /// Creates an error record with only a kind and message.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            code: None,
            http_status: None,
            request_id: None,
            error_type: None,
            param: None,
            decline_code: None,
            body: None,
        }
    }
}

impl fmt::Display for ApiErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(status) = self.http_status {
            write!(f, " (status: {}", status.as_u16())?;
            if let Some(code) = &self.code {
                write!(f, ", code: {code}")?;
            }
            if let Some(request_id) = &self.request_id {
                write!(f, ", request-id: {request_id}")?;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiErrorInfo {}

/// Error type for library operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The API could not be reached; the last transport failure is attached.
    #[error("Could not connect to the API after {attempts} attempt(s): {source}")]
    Connection {
        /// Attempts made, including the first.
        attempts: u32,
        /// Last transport failure
        #[source]
        source: TransportError,
    },

    /// A per-attempt timeout or the overall call deadline was exceeded.
    #[error("Request timed out after {elapsed:?} ({attempts} attempt(s))")]
    Timeout {
        /// Time spent on the logical call.
        elapsed: Duration,
        /// Attempts made, including the interrupted one.
        attempts: u32,
    },

    /// The API answered with an error.
    #[error(transparent)]
    Api(#[from] ApiErrorInfo),

    /// The request was rejected before being sent.
    #[error("Invalid request: {0}")]
    Build(#[from] BuildError),

    /// A webhook payload failed verification.
    #[error(transparent)]
    SignatureVerification(#[from] SignatureVerificationError),
}

impl Error {
    /// Returns the classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Connection { .. } => ErrorKind::Connection,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Api(info) => info.kind,
            Self::Build(_) => ErrorKind::InvalidRequest,
            Self::SignatureVerification(_) => ErrorKind::SignatureVerification,
        }
    }

    /// Returns the HTTP status, when the error came from a response.
    #[must_use]
    pub const fn http_status(&self) -> Option<http::StatusCode> {
        match self {
            Self::Api(info) => info.http_status,
            _ => None,
        }
    }

    /// Returns the request id, when the error came from a response.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::Api(info) => info.request_id.as_deref(),
            _ => None,
        }
    }

    /// Returns the machine-readable code, when the API supplied one.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Api(info) => info.code.as_deref(),
            _ => None,
        }
    }

    /// Returns a uniform [`ApiErrorInfo`] view of this error.
    #[must_use]
    pub fn info(&self) -> ApiErrorInfo {
        match self {
            Self::Api(info) => info.clone(),
            other => ApiErrorInfo::new(other.kind(), other.to_string()),
        }
    }
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn status_mapping_follows_error_table() {
        let cases = [
            (400, ErrorKind::InvalidRequest),
            (401, ErrorKind::Authentication),
            (402, ErrorKind::InvalidRequest),
            (403, ErrorKind::Permission),
            (404, ErrorKind::InvalidRequest),
            (409, ErrorKind::Idempotency),
            (429, ErrorKind::RateLimit),
            (500, ErrorKind::Api),
            (503, ErrorKind::Api),
        ];

        for (code, expected) in cases {
            let status = http::StatusCode::from_u16(code).unwrap();
            assert_eq!(ErrorKind::from_status(status), expected, "status {code}");
        }
    }

    #[test]
    fn transient_kinds() {
        assert!(ErrorKind::Connection.is_transient());
        assert!(ErrorKind::RateLimit.is_transient());
        assert!(!ErrorKind::Authentication.is_transient());
        assert!(!ErrorKind::InvalidRequest.is_transient());
        assert!(!ErrorKind::SignatureVerification.is_transient());
    }

    #[test]
    fn api_error_display_includes_correlation_fields() {
        let mut info = ApiErrorInfo::new(ErrorKind::InvalidRequest, "No such customer");
        info.http_status = Some(http::StatusCode::NOT_FOUND);
        info.code = Some("resource_missing".to_string());
        info.request_id = Some("req_abc".to_string());

        let display = Error::Api(info).to_string();
        assert!(display.starts_with("InvalidRequestError: No such customer"));
        assert!(display.contains("404"));
        assert!(display.contains("resource_missing"));
        assert!(display.contains("req_abc"));
    }

    #[test]
    fn connection_error_keeps_transport_source() {
        let error = Error::Connection {
            attempts: 3,
            source: TransportError::Timeout,
        };

        assert_eq!(error.kind(), ErrorKind::Connection);
        assert!(error.to_string().contains("3 attempt(s)"));
        assert!(error.source().is_some());
    }

    #[test]
    fn info_synthesizes_record_for_non_api_errors() {
        let error = Error::Timeout {
            elapsed: Duration::from_secs(2),
            attempts: 1,
        };
        let info = error.info();

        assert_eq!(info.kind, ErrorKind::Timeout);
        assert!(info.http_status.is_none());
        assert!(info.message.contains("timed out"));
    }

    #[test]
    fn accessors_read_api_fields() {
        let mut info = ApiErrorInfo::new(ErrorKind::RateLimit, "Too many requests");
        info.http_status = Some(http::StatusCode::TOO_MANY_REQUESTS);
        info.request_id = Some("req_1".to_string());
        let error = Error::from(info);

        assert_eq!(error.kind(), ErrorKind::RateLimit);
        assert_eq!(error.http_status(), Some(http::StatusCode::TOO_MANY_REQUESTS));
        assert_eq!(error.request_id(), Some("req_1"));
        assert_eq!(error.code(), None);
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
