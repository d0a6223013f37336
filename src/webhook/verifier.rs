//! HMAC-SHA256 webhook signature verification with replay protection.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::SignatureVerificationError;
use super::header::{EXPECTED_SCHEME, SignatureHeader};
use crate::config::defaults;
use crate::response::Record;
use crate::time::{Clock, SystemClock};

type HmacSha256 = Hmac<Sha256>;

/// Default timestamp tolerance in seconds.
pub const DEFAULT_TOLERANCE: i64 = defaults::WEBHOOK_TOLERANCE_SECS;

/// A verified webhook event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event id (`evt_...`).
    pub id: String,
    /// Event type, e.g. `payment_intent.succeeded`.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Creation time in seconds since the Unix epoch.
    pub created: i64,
    /// Whether the event came from live mode.
    #[serde(default)]
    pub livemode: bool,
    /// API version used to render the payload.
    #[serde(default)]
    pub api_version: Option<String>,
    /// The object the event is about.
    pub data: EventData,
}

/// The `data` member of an [`Event`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventData {
    /// The object as it was when the event fired.
    pub object: Record,
    /// Changed fields and their old values, for `*.updated` events.
    #[serde(default)]
    pub previous_attributes: Option<Record>,
}

/// Computes the hex `v1` signature of `"{timestamp}.{payload}"`.
#[must_use]
pub fn compute_signature(timestamp: i64, payload: &[u8], secret: &str) -> String {
    keyed_mac(secret, timestamp, payload)
        .map(|mac| hex::encode(mac.finalize().into_bytes()))
        .unwrap_or_default()
}

/// Builds a valid signature header for `payload`. Useful in tests and local
/// tooling that replays events.
#[must_use]
pub fn generate_test_header(payload: &[u8], secret: &str, timestamp: i64) -> String {
    SignatureHeader {
        timestamp,
        signatures: vec![(
            EXPECTED_SCHEME.to_string(),
            compute_signature(timestamp, payload, secret),
        )],
    }
    .to_string()
}

fn keyed_mac(secret: &str, timestamp: i64, payload: &[u8]) -> Option<HmacSha256> {
    // HMAC accepts keys of any length, so this only fails for exotic digests.
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Some(mac)
}

/// Verifies webhook signatures against one or more secrets.
///
/// Wall-clock time comes from the injected [`Clock`]. A tolerance of zero or
/// less disables the timestamp check.
///
/// # Example
///
/// ```
/// use stripe_core::time::FixedClock;
/// use stripe_core::webhook::{WebhookVerifier, generate_test_header};
///
/// let payload = br#"{"id":"evt_1"}"#;
/// let header = generate_test_header(payload, "whsec_test", 1_700_000_000);
/// let verifier = WebhookVerifier::with_clock(FixedClock(1_700_000_010));
///
/// assert!(verifier.verify(payload, &header, "whsec_test", 300).is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct WebhookVerifier<K: Clock = SystemClock> {
    clock: K,
}

impl WebhookVerifier<SystemClock> {
    /// Creates a verifier using the system clock.
    #[must_use]
    pub const fn new() -> Self {
        Self { clock: SystemClock }
    }
}

impl<K: Clock> WebhookVerifier<K> {
    /// Creates a verifier using `clock`.
    pub const fn with_clock(clock: K) -> Self {
        Self { clock }
    }

    /// Verifies `payload` against `header` with a single secret.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureVerificationError`] if the header is malformed, has
    /// no `v1` signature, no signature matches, or the timestamp is outside
    /// the tolerance.
    pub fn verify(
        &self,
        payload: &[u8],
        header: &str,
        secret: &str,
        tolerance: i64,
    ) -> Result<SignatureHeader, SignatureVerificationError> {
        self.verify_any(payload, header, &[secret], tolerance)
    }

    /// Verifies `payload` against `header`, accepting a signature made with
    /// any of `secrets`. Used while a signing secret is being rotated.
    ///
    /// # Errors
    ///
    /// See [`verify`](Self::verify).
    pub fn verify_any<S: AsRef<str>>(
        &self,
        payload: &[u8],
        header: &str,
        secrets: &[S],
        tolerance: i64,
    ) -> Result<SignatureHeader, SignatureVerificationError> {
        let parsed = SignatureHeader::parse(header)?;

        if parsed.signatures_for(EXPECTED_SCHEME).next().is_none() {
            return Err(SignatureVerificationError::NoSignaturesForScheme {
                scheme: EXPECTED_SCHEME,
            });
        }

        // Signatures that are not valid hex can never match.
        let candidates: Vec<Vec<u8>> = parsed
            .signatures_for(EXPECTED_SCHEME)
            .filter_map(|sig| hex::decode(sig).ok())
            .collect();

        let matched = secrets.iter().any(|secret| {
            keyed_mac(secret.as_ref(), parsed.timestamp, payload).is_some_and(|mac| {
                candidates
                    .iter()
                    .any(|candidate| mac.clone().verify_slice(candidate).is_ok())
            })
        });
        if !matched {
            return Err(SignatureVerificationError::Mismatch);
        }

        if tolerance > 0 {
            let now = self.clock.unix_seconds();
            if now.abs_diff(parsed.timestamp) > tolerance.unsigned_abs() {
                return Err(SignatureVerificationError::TimestampOutsideTolerance {
                    timestamp: parsed.timestamp,
                    now,
                    tolerance,
                });
            }
        }

        tracing::trace!("Webhook signature verified (t={})", parsed.timestamp);
        Ok(parsed)
    }

    /// Verifies the payload, then decodes it as an [`Event`].
    ///
    /// # Errors
    ///
    /// Returns any verification error, or
    /// [`SignatureVerificationError::InvalidPayload`] if the authentic payload
    /// is not an event.
    pub fn construct_event(
        &self,
        payload: &[u8],
        header: &str,
        secret: &str,
        tolerance: i64,
    ) -> Result<Event, SignatureVerificationError> {
        self.construct_event_any(payload, header, &[secret], tolerance)
    }

    /// Multi-secret variant of [`construct_event`](Self::construct_event).
    ///
    /// # Errors
    ///
    /// See [`construct_event`](Self::construct_event).
    pub fn construct_event_any<S: AsRef<str>>(
        &self,
        payload: &[u8],
        header: &str,
        secrets: &[S],
        tolerance: i64,
    ) -> Result<Event, SignatureVerificationError> {
        self.verify_any(payload, header, secrets, tolerance)?;
        serde_json::from_slice(payload)
            .map_err(|e| SignatureVerificationError::InvalidPayload(e.to_string()))
    }
}

/// Verifies with the system clock. See [`WebhookVerifier::verify`].
///
/// # Errors
///
/// See [`WebhookVerifier::verify`].
pub fn verify(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance: i64,
) -> Result<SignatureHeader, SignatureVerificationError> {
    WebhookVerifier::new().verify(payload, header, secret, tolerance)
}

/// Verifies with the system clock. See [`WebhookVerifier::verify_any`].
///
/// # Errors
///
/// See [`WebhookVerifier::verify`].
pub fn verify_any<S: AsRef<str>>(
    payload: &[u8],
    header: &str,
    secrets: &[S],
    tolerance: i64,
) -> Result<SignatureHeader, SignatureVerificationError> {
    WebhookVerifier::new().verify_any(payload, header, secrets, tolerance)
}

/// Verifies with the system clock and decodes the event. See
/// [`WebhookVerifier::construct_event`].
///
/// # Errors
///
/// See [`WebhookVerifier::construct_event`].
pub fn construct_event(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance: i64,
) -> Result<Event, SignatureVerificationError> {
    WebhookVerifier::new().construct_event(payload, header, secret, tolerance)
}
