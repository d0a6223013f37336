//! Turns raw HTTP responses into results or typed errors.

use http::{HeaderMap, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use super::object::{ApiObject, ObjectRegistry};
use crate::error::{ApiErrorInfo, ErrorKind};
use crate::transport::HttpResponse;

/// Response header carrying the server-assigned request id.
pub const REQUEST_ID_HEADER: &str = "request-id";

/// A successful API response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResult {
    /// HTTP status (always 2xx).
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Decoded JSON body.
    pub body: Value,
    /// Value of the `Request-Id` header.
    pub request_id: Option<String>,
}

impl ApiResult {
    /// Decodes the body into an [`ApiObject`] through `registry`.
    ///
    /// # Errors
    ///
    /// Returns an `APIError` record if the body is not a JSON object.
    pub fn into_object(self, registry: &ObjectRegistry) -> Result<ApiObject, ApiErrorInfo> {
        let request_id = self.request_id;
        registry.convert(self.body).ok_or_else(|| {
            let mut info = ApiErrorInfo::new(ErrorKind::Api, "Response body is not an object");
            info.request_id = request_id;
            info
        })
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(rename = "type")]
    error_type: Option<String>,
    message: Option<String>,
    code: Option<String>,
    param: Option<String>,
    decline_code: Option<String>,
}

/// Reads the request id from response headers.
#[must_use]
pub fn request_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Parses a response.
///
/// 2xx bodies must be JSON. Other statuses are decoded from the
/// `{"error": {...}}` envelope and classified with
/// [`ErrorKind::from_status`]; an envelope that cannot be decoded yields an
/// `APIError` describing the raw body and status.
///
/// # Errors
///
/// Returns the [`ApiErrorInfo`] for any non-2xx response or a malformed
/// 2xx body.
pub fn parse_response(response: HttpResponse) -> Result<ApiResult, ApiErrorInfo> {
    let request_id = request_id(&response.headers);
    let status = response.status;

    if status.is_success() {
        return match serde_json::from_slice::<Value>(&response.body) {
            Ok(body) => Ok(ApiResult {
                status,
                headers: response.headers,
                body,
                request_id,
            }),
            Err(_) => Err(invalid_response(&response, request_id)),
        };
    }

    match serde_json::from_slice::<ErrorEnvelope>(&response.body) {
        Ok(envelope) => {
            let error = envelope.error;
            let mut info = ApiErrorInfo::new(
                ErrorKind::from_status(status),
                error
                    .message
                    .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16())),
            );
            info.http_status = Some(status);
            info.request_id = request_id;
            info.code = error.code;
            info.error_type = error.error_type;
            info.param = error.param;
            info.decline_code = error.decline_code;
            info.body = response.body_text().map(str::to_string);
            Err(info)
        }
        Err(_) => Err(invalid_response(&response, request_id)),
    }
}

fn invalid_response(response: &HttpResponse, request_id: Option<String>) -> ApiErrorInfo {
    let body = String::from_utf8_lossy(&response.body);
    let mut info = ApiErrorInfo::new(
        ErrorKind::Api,
        format!(
            "Invalid response object from API: {body:?} (HTTP response code was {})",
            response.status.as_u16()
        ),
    );
    info.http_status = Some(response.status);
    info.request_id = request_id;
    info.body = response.body_text().map(str::to_string);
    info
}
