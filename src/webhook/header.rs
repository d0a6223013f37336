//! The `Stripe-Signature` header: `t=<unix-seconds>,v1=<hex>[,v1=<hex>...]`.

use std::fmt;

use super::SignatureVerificationError;

/// Scheme whose signatures are checked.
pub const EXPECTED_SCHEME: &str = "v1";

/// A parsed signature header.
///
/// Several signatures may be present while a secret is being rotated. Schemes
/// other than `v1` (such as `v0`) are kept but never checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Signing time in seconds since the Unix epoch.
    pub timestamp: i64,
    /// `(scheme, hex signature)` pairs in header order.
    pub signatures: Vec<(String, String)>,
}

impl SignatureHeader {
    /// Parses a header value.
    ///
    /// Items without `=` are ignored. A repeated `t=` keeps the last value.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureVerificationError::MalformedHeader`] if there is no
    /// integer timestamp.
    pub fn parse(header: &str) -> Result<Self, SignatureVerificationError> {
        let mut timestamp = None;
        let mut signatures = Vec::new();

        for item in header.split(',') {
            let Some((key, value)) = item.split_once('=') else {
                continue;
            };
            let (key, value) = (key.trim(), value.trim());
            if key == "t" {
                timestamp = Some(
                    value
                        .parse::<i64>()
                        .map_err(|_| SignatureVerificationError::MalformedHeader)?,
                );
            } else if !key.is_empty() {
                signatures.push((key.to_string(), value.to_string()));
            }
        }

        let timestamp = timestamp.ok_or(SignatureVerificationError::MalformedHeader)?;
        Ok(Self {
            timestamp,
            signatures,
        })
    }

    /// Signatures of the given scheme, in header order.
    pub fn signatures_for<'a>(&'a self, scheme: &'a str) -> impl Iterator<Item = &'a str> {
        self.signatures
            .iter()
            .filter(move |(s, _)| s == scheme)
            .map(|(_, sig)| sig.as_str())
    }
}

impl fmt::Display for SignatureHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={}", self.timestamp)?;
        for (scheme, signature) in &self.signatures {
            write!(f, ",{scheme}={signature}")?;
        }
        Ok(())
    }
}
