//! `multipart/form-data` bodies for file uploads.

use std::fmt::Write as _;

use super::BuildError;
use super::encode::FormField;

/// An encoded multipart body and its content type (with boundary).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartBody {
    /// Value for the `Content-Type` header.
    pub content_type: String,
    /// Encoded body.
    pub body: Vec<u8>,
}

/// Encodes flattened form fields as a multipart body.
///
/// The request builder delegates to this trait whenever a parameter is a
/// file, so callers can plug in a streaming or otherwise specialized encoder.
pub trait MultipartEncoder: Send + Sync + std::fmt::Debug {
    /// Encodes the fields in order.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Encoding`] if a field cannot be represented.
    fn encode(&self, fields: &[FormField<'_>]) -> Result<MultipartBody, BuildError>;
}

/// Default [`MultipartEncoder`] writing RFC 7578 `multipart/form-data`.
///
/// The boundary is chosen once per encoder so the same fields always encode
/// to the same bytes.
#[derive(Debug, Clone)]
pub struct FormDataEncoder {
    boundary: String,
}

impl FormDataEncoder {
    /// Creates an encoder with a random boundary.
    #[must_use]
    pub fn new() -> Self {
        Self::with_boundary(format!("stripe-core-{}", uuid::Uuid::new_v4().simple()))
    }

    /// Creates an encoder with a fixed boundary.
    #[must_use]
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
        }
    }

    /// The multipart boundary.
    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }
}

impl Default for FormDataEncoder {
    fn default() -> Self {
        Self::new()
    }
}

fn escape_quoted(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Rejects values that would end a part header line early.
fn header_safe<'a>(what: &str, value: &'a str) -> Result<&'a str, BuildError> {
    if value.contains(['\r', '\n']) {
        return Err(BuildError::Encoding(format!(
            "{what} {value:?} contains a line break"
        )));
    }
    Ok(value)
}

impl MultipartEncoder for FormDataEncoder {
    fn encode(&self, fields: &[FormField<'_>]) -> Result<MultipartBody, BuildError> {
        let mut body = Vec::new();
        for field in fields {
            let mut head = String::new();
            let key = escape_quoted(header_safe("field name", field.key())?);

            // Writing to a String cannot fail.
            let _ = write!(head, "--{}\r\n", self.boundary);
            match field {
                FormField::Text { value, .. } => {
                    let _ = write!(
                        head,
                        "Content-Disposition: form-data; name=\"{key}\"\r\n\r\n"
                    );
                    body.extend_from_slice(head.as_bytes());
                    body.extend_from_slice(value.as_bytes());
                }
                FormField::File { file, .. } => {
                    let filename = escape_quoted(header_safe("filename", &file.filename)?);
                    let content_type = header_safe(
                        "content type",
                        file.content_type
                            .as_deref()
                            .unwrap_or("application/octet-stream"),
                    )?;
                    let _ = write!(
                        head,
                        "Content-Disposition: form-data; name=\"{key}\"; filename=\"{filename}\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    );
                    body.extend_from_slice(head.as_bytes());
                    body.extend_from_slice(&file.data);
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());

        Ok(MultipartBody {
            content_type: format!("multipart/form-data; boundary={}", self.boundary),
            body,
        })
    }
}
