//! Inbound webhook authentication.
//!
//! This module provides:
//! - Signature header parsing ([`SignatureHeader`])
//! - HMAC-SHA256 verification with constant-time comparison and a replay
//!   window ([`WebhookVerifier`], [`verify`], [`verify_any`])
//! - Verified event decoding ([`Event`], [`construct_event`])
//! - Header generation for tests and tooling ([`generate_test_header`])
//!
//! No network access is involved.

mod error;
mod header;
mod verifier;


pub use error::SignatureVerificationError;
pub use header::{EXPECTED_SCHEME, SignatureHeader};
pub use verifier::{
    DEFAULT_TOLERANCE, Event, EventData, WebhookVerifier, compute_signature, construct_event,
    generate_test_header, verify, verify_any,
};
