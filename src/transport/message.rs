//! HTTP request/response types and the transport traits.

use super::TransportError;

/// An HTTP request ready to be put on the wire.
///
/// This is a value type produced by the request builder and passed to any
/// [`Transport`] implementation. It uses standard `http` crate types for
/// method and headers.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method (GET, POST, DELETE, ...)
    pub method: http::Method,
    /// Target URL, including the encoded query string
    pub url: url::Url,
    /// HTTP headers to send
    pub headers: http::HeaderMap,
    /// Optional request body
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Creates a new HTTP request with the given method and URL.
    ///
    /// Headers are initialized to an empty map and body is `None`.
    #[must_use]
    pub fn new(method: http::Method, url: url::Url) -> Self {
        Self {
            method,
            url,
            headers: http::HeaderMap::new(),
            body: None,
        }
    }

    /// Creates a GET request to the given URL.
    #[must_use]
    pub fn get(url: url::Url) -> Self {
        Self::new(http::Method::GET, url)
    }

    /// Creates a POST request to the given URL.
    #[must_use]
    pub fn post(url: url::Url) -> Self {
        Self::new(http::Method::POST, url)
    }

    /// Sets the request body.
    #[must_use]
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Adds a header to the request.
    ///
    /// If the header name already exists, the value is appended.
    #[must_use]
    pub fn with_header(mut self, name: http::HeaderName, value: http::HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Returns the value of a header as a string, if present and visible ASCII.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the connection pool key for this request: `scheme://host:port`.
    #[must_use]
    pub fn host_key(&self) -> String {
        host_key(&self.url)
    }
}

/// Computes the pool key for a URL.
///
/// Default ports are made explicit so `https://api.stripe.com` and
/// `https://api.stripe.com:443` share a bucket.
#[must_use]
pub fn host_key(url: &url::Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port_or_known_default() {
        Some(port) => format!("{}://{host}:{port}", url.scheme()),
        None => format!("{}://{host}", url.scheme()),
    }
}

/// An HTTP response received from a server.
///
/// The body is fully buffered into memory.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: http::StatusCode,
    /// Response headers (case-insensitive lookup)
    pub headers: http::HeaderMap,
    /// Response body (fully buffered)
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a new HTTP response.
    #[must_use]
    pub const fn new(status: http::StatusCode, headers: http::HeaderMap, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Returns true if the status code indicates success (2xx).
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns the body as a UTF-8 string, if valid.
    #[must_use]
    pub fn body_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    /// Returns the value of a header as a string, if present and visible ASCII.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// A single connection handle able to carry HTTP exchanges to one host.
///
/// # Design
///
/// This trait abstracts the HTTP library so that:
/// - the executor can be tested against scripted mock transports
/// - the connection pool can manage handles without knowing what they wrap
///
/// Implementations must not retry internally; the executor owns retries.
pub trait Transport: Send + Sync {
    /// Sends an HTTP request and returns the buffered response.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when:
    /// - Network connection fails ([`TransportError::Connection`])
    /// - Request times out ([`TransportError::Timeout`])
    /// - URL or headers are rejected ([`TransportError::InvalidUrl`])
    fn send(
        &self,
        req: HttpRequest,
    ) -> impl std::future::Future<Output = Result<HttpResponse, TransportError>> + Send;
}

/// Opens new [`Transport`] handles for a host.
///
/// The connection pool calls this when no idle handle is available for a host.
pub trait Connector: Send + Sync {
    /// The transport handle produced by this connector.
    type Transport: Transport;

    /// Opens a new connection handle for `host` (a `scheme://host:port` key).
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the handle cannot be created.
    fn connect(
        &self,
        host: &str,
    ) -> impl std::future::Future<Output = Result<Self::Transport, TransportError>> + Send;
}
