//! Transport layer for sending HTTP requests to the API.
//!
//! This module provides types and traits for:
//! - Wire-ready HTTP requests ([`HttpRequest`])
//! - Buffered HTTP responses ([`HttpResponse`])
//! - Abstract connection handles ([`Transport`]) and their factory ([`Connector`])
//! - Production implementation on reqwest ([`ReqwestConnector`], [`ReqwestTransport`])

mod client;
mod error;
mod message;


pub use client::{ReqwestConnector, ReqwestTransport, TransportSettings};
pub use error::TransportError;
pub use message::{Connector, HttpRequest, HttpResponse, Transport, host_key};
